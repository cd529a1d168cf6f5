//! Example: Print an outline of an XML document
//!
//! This example builds an element tree from a file and prints each element
//! with its attributes and the text it accumulated.
//!
//! Usage: cargo run --example outline <file.xml>

use std::env;

use element_tree::{ElementRef, MismatchPolicy, ParseOptions, XmlParser};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args: Vec<String> = env::args().collect();

    if args.len() != 2 {
        eprintln!("Usage: {} <file.xml>", args[0]);
        std::process::exit(1);
    }

    let options = ParseOptions::default()
        .with_policy(MismatchPolicy::Strict)
        .with_ignore_whitespace(true);
    let parser = XmlParser::new(options);

    eprintln!("Parsing: {}", args[1]);
    let root = parser.parse_file(&args[1])?;

    print_node(&root, 0);
    Ok(())
}

fn print_node(node: &ElementRef, depth: usize) {
    let element = node.borrow();
    let indent = "  ".repeat(depth);
    println!("{}{} {:?}", indent, element.tag(), element.attributes());
    if element.child_count() == 0 {
        if let Some(text) = element.text() {
            println!("{}  = {:?}", indent, text);
        }
    }
    for child in element.children() {
        print_node(child, depth + 1);
    }
}
