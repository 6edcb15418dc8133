//! Label-to-control association.
//!
//! Phrases usually name a field by its visible label, but the node a caller
//! wants to type into is the control, not the `<label>`. These helpers walk from
//! matching labels (or form-group wrappers) to the control they describe.

use crate::accessor::{PageAccessor, dedup_facts, inspect_all, query_facts};
use pinpoint_common::{
    AccessorError, NodeFacts, NodeHandle, StructuralQuery, TagSelector, TextMatch,
};

const MAX_LABELS: usize = 5;
const MAX_FORM_GROUPS: usize = 10;

const FORM_GROUP_CLASSES: [&str; 6] = [
    "form-group",
    "form-item",
    "form-field",
    "form-row",
    "input-group",
    "field",
];

/// Tags that accept typed or chosen values.
pub fn control_scope() -> Vec<TagSelector> {
    vec![
        TagSelector::tag("input"),
        TagSelector::tag("textarea"),
        TagSelector::tag("select"),
        TagSelector::attr("contenteditable", "true"),
    ]
}

fn is_control(facts: &NodeFacts) -> bool {
    control_scope().iter().any(|s| s.matches(facts))
}

/// First inspectable node returned by `query`.
async fn first(
    accessor: &dyn PageAccessor,
    query: &StructuralQuery,
) -> Result<Option<NodeFacts>, AccessorError> {
    let handles = accessor.query_all(query).await?;
    for handle in handles {
        if let Some(f) = inspect_all(accessor, &[handle]).await?.pop() {
            return Ok(Some(f));
        }
    }
    Ok(None)
}

/// Controls described by `<label>`s whose text contains `name`.
///
/// Association order per label:
/// 1. `for` attribute: `<label for="x">` → element with `id="x"`
/// 2. Nested control: `<label>Email <input></label>`
/// 3. Following sibling: `<label>Email</label><input>`
/// 4. Inside the next sibling: `<label>About</label><div><div contenteditable/></div>`
/// 5. Parent's next sibling: `<div><label/></div><div><input/></div>`
pub async fn labelled_controls(
    accessor: &dyn PageAccessor,
    name: &str,
) -> Result<Vec<NodeFacts>, AccessorError> {
    if name.trim().is_empty() {
        return Ok(Vec::new());
    }
    let labels = query_facts(
        accessor,
        &StructuralQuery::text(&[TagSelector::tag("label")], name, TextMatch::Contains),
    )
    .await?;

    let mut controls = Vec::new();
    for label in labels.iter().take(MAX_LABELS) {
        if let Some(control) = associated_control(accessor, label).await? {
            controls.push(control);
        }
    }
    Ok(dedup_facts(controls))
}

async fn associated_control(
    accessor: &dyn PageAccessor,
    label: &NodeFacts,
) -> Result<Option<NodeFacts>, AccessorError> {
    if let Some(for_id) = label.attr("for").filter(|v| !v.trim().is_empty())
        && let Some(control) = first(accessor, &StructuralQuery::Id(for_id.to_string())).await?
    {
        return Ok(Some(control));
    }

    let nested = StructuralQuery::within(label.handle, StructuralQuery::Select(control_scope()));
    if let Some(control) = first(accessor, &nested).await? {
        return Ok(Some(control));
    }

    let sibling = StructuralQuery::FollowingSiblings {
        of: label.handle,
        scope: control_scope(),
    };
    if let Some(control) = first(accessor, &sibling).await? {
        return Ok(Some(control));
    }
    if let Some(control) = next_control_after(accessor, label.handle).await? {
        return Ok(Some(control));
    }

    let parents = accessor.query_all(&StructuralQuery::Parent(label.handle)).await?;
    if let Some(&parent) = parents.first() {
        return next_control_after(accessor, parent).await;
    }
    Ok(None)
}

/// The control that is, or sits inside, the next sibling of `node`.
async fn next_control_after(
    accessor: &dyn PageAccessor,
    node: NodeHandle,
) -> Result<Option<NodeFacts>, AccessorError> {
    let siblings = accessor
        .query_all(&StructuralQuery::FollowingSiblings {
            of: node,
            scope: vec![TagSelector::any()],
        })
        .await?;
    let Some(&next) = siblings.first() else {
        return Ok(None);
    };
    if let Some(facts) = inspect_all(accessor, &[next]).await?.pop()
        && is_control(&facts)
    {
        return Ok(Some(facts));
    }
    first(
        accessor,
        &StructuralQuery::within(next, StructuralQuery::Select(control_scope())),
    )
    .await
}

/// Controls inside form-group style wrappers whose text mentions `name`.
pub async fn form_group_controls(
    accessor: &dyn PageAccessor,
    name: &str,
) -> Result<Vec<NodeFacts>, AccessorError> {
    if name.trim().is_empty() {
        return Ok(Vec::new());
    }
    let selectors: Vec<TagSelector> = FORM_GROUP_CLASSES
        .iter()
        .map(|c| TagSelector::class(c))
        .collect();
    let groups = accessor.query_all(&StructuralQuery::Select(selectors)).await?;

    let mut controls = Vec::new();
    for group in groups.into_iter().take(MAX_FORM_GROUPS) {
        let mentions = accessor
            .query_all(&StructuralQuery::within(
                group,
                StructuralQuery::text(&[TagSelector::any()], name, TextMatch::Contains),
            ))
            .await?;
        if mentions.is_empty() {
            continue;
        }
        let inner = StructuralQuery::within(group, StructuralQuery::Select(control_scope()));
        if let Some(control) = first(accessor, &inner).await? {
            controls.push(control);
        }
    }
    Ok(dedup_facts(controls))
}
