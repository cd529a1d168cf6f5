//! Element Tree CLI
//!
//! Builds a tree from an XML file and prints views of it.

use std::io::{self, BufWriter, Write};

use clap::{Args, Parser, Subcommand};
use element_tree::{
    ElementInner, ElementRef, EventLog, MismatchPolicy, ParseOptions, Parts, XmlParser,
};
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Build element trees from XML and inspect them
#[derive(Parser)]
#[command(name = "etree")]
#[command(version)]
#[command(about = "Build element trees from XML and inspect them", long_about = None)]
struct Cli {
    #[command(flatten)]
    global: GlobalArgs,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct GlobalArgs {
    /// Ignore close tags that do not match the open element instead of failing
    #[arg(long, global = true)]
    lenient: bool,

    /// Drop whitespace-only character data
    #[arg(short = 'w', long, global = true)]
    ignore_whitespace: bool,

    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,
}

#[derive(Subcommand)]
enum Commands {
    /// Print an outline of the element tree
    #[command(visible_alias = "t")]
    Tree {
        /// Input XML file
        file: String,
    },

    /// Print the events the tokenizer delivers
    #[command(visible_alias = "e")]
    Events {
        /// Input XML file
        file: String,
    },

    /// Look up elements by a slash-separated tag path
    #[command(visible_alias = "g")]
    Get {
        /// Input XML file
        file: String,
        /// Tag path from the root, e.g. "book/chapter"
        path: String,
        /// Print every element with the last tag of the path
        #[arg(long, conflicts_with = "last")]
        all: bool,
        /// Print the last element with the last tag of the path
        #[arg(long)]
        last: bool,
    },

    /// Print the accumulated text of the root or of the element at a path
    Text {
        /// Input XML file
        file: String,
        /// Tag path from the root
        path: Option<String>,
    },
}

fn main() -> std::process::ExitCode {
    let cli = Cli::parse();
    init_logging(cli.global.verbose);

    let parser = XmlParser::new(parse_options(&cli.global));
    let stdout = io::stdout();
    let mut out = BufWriter::new(stdout.lock());

    let result = match cli.command {
        Commands::Tree { file } => run_tree(&parser, &file, &mut out),
        Commands::Events { file } => run_events(&parser, &file, &mut out),
        Commands::Get {
            file,
            path,
            all,
            last,
        } => {
            let parts = match (all, last) {
                (true, _) => Parts::All,
                (_, true) => Parts::Last,
                _ => Parts::First,
            };
            run_get(&parser, &file, &path, parts, &mut out)
        }
        Commands::Text { file, path } => run_text(&parser, &file, path.as_deref(), &mut out),
    };

    match result.and_then(|()| out.flush().map_err(Into::into)) {
        Ok(()) => std::process::ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::ExitCode::FAILURE
        }
    }
}

type CliResult = Result<(), Box<dyn std::error::Error>>;

fn init_logging(verbose: u8) {
    let default_level = match verbose {
        0 => "warn",
        1 => "debug",
        _ => "trace",
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_writer(io::stderr)
        .with_env_filter(filter)
        .init();
}

fn parse_options(args: &GlobalArgs) -> ParseOptions {
    let policy = if args.lenient {
        MismatchPolicy::Lenient
    } else {
        MismatchPolicy::Strict
    };
    ParseOptions::default()
        .with_policy(policy)
        .with_ignore_whitespace(args.ignore_whitespace)
}

/// Prints one line per element, indented by depth.
fn run_tree(parser: &XmlParser, path: &str, out: &mut impl Write) -> CliResult {
    info!(file = path, "building tree");
    let root = parser.parse_file(path)?;
    print_outline(&root, out)?;
    Ok(())
}

fn print_outline(root: &ElementRef, out: &mut impl Write) -> io::Result<()> {
    let mut pending = vec![(root.clone(), 0usize)];
    while let Some((node, depth)) = pending.pop() {
        let element = node.borrow();
        writeln!(
            out,
            "{}{} ({} children)",
            "  ".repeat(depth),
            describe(&element),
            element.child_count()
        )?;
        for child in element.children().iter().rev() {
            pending.push((child.clone(), depth + 1));
        }
    }
    Ok(())
}

/// Prints the tokenizer's event stream without building a tree.
fn run_events(parser: &XmlParser, path: &str, out: &mut impl Write) -> CliResult {
    let mut log = EventLog::new();
    parser.stream_file(path, &mut log)?;
    info!(events = log.len(), "recorded events");
    for event in log.events() {
        writeln!(out, "{}", event)?;
    }
    Ok(())
}

fn run_get(
    parser: &XmlParser,
    path: &str,
    tag_path: &str,
    parts: Parts,
    out: &mut impl Write,
) -> CliResult {
    let root = parser.parse_file(path)?;
    let (parent_path, tag) = match tag_path.trim_matches('/').rsplit_once('/') {
        Some((parent, tag)) => (Some(parent), tag),
        None => (None, tag_path.trim_matches('/')),
    };

    let parent = match parent_path {
        Some(parent_path) => {
            let found = root.borrow().find_path(parent_path);
            found.ok_or_else(|| format!("no element at path {:?}", parent_path))?
        }
        None => root,
    };

    let matches = parent.borrow().select(tag, parts)?;
    for element in &matches {
        let element = element.borrow();
        writeln!(out, "{}", describe(&element))?;
        if let Some(text) = element.text() {
            writeln!(out, "  text: {:?}", text)?;
        }
    }
    Ok(())
}

fn run_text(
    parser: &XmlParser,
    path: &str,
    tag_path: Option<&str>,
    out: &mut impl Write,
) -> CliResult {
    let root = parser.parse_file(path)?;
    let node = match tag_path {
        Some(tag_path) => {
            let found = root.borrow().find_path(tag_path);
            found.ok_or_else(|| format!("no element at path {:?}", tag_path))?
        }
        None => root,
    };
    if let Some(text) = node.borrow().text() {
        writeln!(out, "{}", text)?;
    }
    Ok(())
}

/// Formats a tag with its attributes sorted by name.
fn describe(element: &ElementInner) -> String {
    let mut attributes: Vec<_> = element.attributes().iter().collect();
    attributes.sort();
    let mut line = format!("<{}", element.tag());
    for (name, value) in attributes {
        line.push_str(&format!(" {}={:?}", name, value));
    }
    line.push('>');
    line
}
