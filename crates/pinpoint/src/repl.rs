use crate::load_snapshot;
use pinpoint_engine::{PageContext, Resolver, SnapshotAccessor};
use std::io::{self, Write};
use std::path::Path;

enum Line<'a> {
    Resolve(&'a str),
    All(&'a str),
    Parse(&'a str),
    Load(&'a str),
    Clear,
}

impl<'a> Line<'a> {
    fn read(line: &'a str) -> Self {
        let (head, rest) = line.split_once(' ').unwrap_or((line, ""));
        let rest = rest.trim();
        match head {
            ":all" => Line::All(rest),
            ":parse" => Line::Parse(rest),
            ":load" => Line::Load(rest),
            ":clear" => Line::Clear,
            _ => Line::Resolve(line),
        }
    }
}

pub async fn run_file(
    resolver: &Resolver,
    mut ctx: PageContext<SnapshotAccessor>,
    path: &Path,
) -> anyhow::Result<()> {
    let content = tokio::fs::read_to_string(path).await?;
    for line in content.lines() {
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }
        execute_line(resolver, &mut ctx, trimmed).await?;
    }
    Ok(())
}

async fn execute_line(
    resolver: &Resolver,
    ctx: &mut PageContext<SnapshotAccessor>,
    line: &str,
) -> anyhow::Result<()> {
    match Line::read(line) {
        Line::Resolve(phrase) => match resolver.resolve_detailed(ctx, phrase).await {
            Ok(r) => {
                let source = match (&r.strategy, r.score) {
                    (Some(strategy), Some(score)) => format!("{}, score {}", strategy, score),
                    _ => "cached".to_string(),
                };
                println!("{} ({})", r.node, source);
            }
            Err(e) => println!("Not found: {}", e),
        },
        Line::All(phrase) => {
            let nodes = resolver.resolve_all(ctx, phrase).await;
            if nodes.is_empty() {
                println!("No candidates.");
            }
            for node in nodes {
                println!("  {}", node);
            }
        }
        Line::Parse(phrase) => {
            println!("{}", serde_json::to_string_pretty(&resolver.parse(phrase))?);
        }
        Line::Load(path) => match load_snapshot(Path::new(path)).await {
            Ok(accessor) => {
                *ctx = PageContext::new(accessor);
                println!("Loaded {}", ctx.accessor().url().await);
            }
            Err(e) => println!("Load Error: {:#}", e),
        },
        Line::Clear => {
            resolver.clear_cache(ctx);
            println!("Cache cleared.");
        }
    }
    Ok(())
}

pub async fn run_repl(
    resolver: &Resolver,
    mut ctx: PageContext<SnapshotAccessor>,
) -> anyhow::Result<()> {
    println!("Snapshot loaded: {}", ctx.accessor().url().await);
    println!("Enter a phrase to resolve, e.g. Click on the blue Submit button");
    println!("Commands: :all <phrase>, :parse <phrase>, :load <file>, :clear. Type 'exit' to quit.");

    let stdin = io::stdin();
    let mut stdout = io::stdout();
    let mut input = String::new();

    loop {
        print!("> ");
        stdout.flush()?;
        input.clear();
        if stdin.read_line(&mut input)? == 0 {
            break;
        }

        let trimmed = input.trim();
        if trimmed.is_empty() {
            continue;
        }
        if trimmed == "exit" || trimmed == "quit" {
            break;
        }

        execute_line(resolver, &mut ctx, trimmed).await?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_commands_and_phrases() {
        assert!(matches!(Line::read(":all Click Save"), Line::All("Click Save")));
        assert!(matches!(Line::read(":clear"), Line::Clear));
        assert!(matches!(
            Line::read("Click the :all button"),
            Line::Resolve("Click the :all button")
        ));
    }
}
