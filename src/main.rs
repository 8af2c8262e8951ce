use std::env;
use xxindex::{AccessOptions, ExtractorOptions, IndexOptions, XpathAccess};

fn main() {
    let args: Vec<String> = env::args().collect();

    if args.len() < 2 {
        eprintln!(
            "Usage: {} <xml-file> [xpath ...] [--encoding NAME] [--no-lines] [--keep-ns]",
            args[0]
        );
        std::process::exit(1);
    }

    let xml_path = &args[1];
    let mut index_options = IndexOptions::default();
    let mut extractor_options = ExtractorOptions::default();
    let mut xpaths: Vec<&str> = Vec::new();

    let mut rest = args[2..].iter();
    while let Some(arg) = rest.next() {
        match arg.as_str() {
            "--encoding" => match rest.next() {
                Some(name) => extractor_options = extractor_options.with_encoding(name.as_str()),
                None => {
                    eprintln!("ERROR: --encoding flag requires an argument.");
                    std::process::exit(1);
                }
            },
            "--no-lines" => index_options = index_options.with_line_numbers(false),
            "--keep-ns" => index_options = index_options.with_namespace_prefix_stripping(false),
            xpath => xpaths.push(xpath),
        }
    }

    println!("Indexing XML file: {}", xml_path);
    println!("{}", "=".repeat(60));

    let access = match XpathAccess::open(xml_path, AccessOptions::new(index_options, extractor_options)) {
        Ok(access) => access,
        Err(e) => {
            eprintln!("\nERROR: Failed to index XML file");
            eprintln!("  {}", e);
            std::process::exit(1);
        }
    };

    let index = access.index();
    println!("\nIndex Information:");
    println!("  Checksum: {}", index.checksum());
    println!("  Encoding: {}", access.extractor().encoding().name());
    println!("  Distinct xpaths: {}", index.len());
    println!("  Total elements: {}", index.total_elements());

    if xpaths.is_empty() {
        println!("\nXpaths:");
        print!("{}", index);
        return;
    }

    for xpath in xpaths {
        println!("\n{}", "=".repeat(60));
        match access.element_count(xpath) {
            Some(count) => println!("{} ({} elements)", xpath, count),
            None => {
                println!("{} (not indexed)", xpath);
                continue;
            }
        }
        for (i, result) in access.element_iter(xpath, None).enumerate() {
            match result {
                Ok(element) => match element.line {
                    Some(line) => println!("  {}. [line {}] {}", i + 1, line, element.snippet),
                    None => println!("  {}. {}", i + 1, element.snippet),
                },
                Err(e) => {
                    eprintln!("  {}. ERROR: {}", i + 1, e);
                }
            }
        }
    }
}
