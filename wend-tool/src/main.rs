use wend_model::{LoaderOptions, load_str};
use wend_validator::Validator;

use std::fs::File;
use std::io::Read;
use std::path::PathBuf;
use std::process::exit;

use structopt::StructOpt;

#[derive(Debug, StructOpt)]
enum Cli {
    /// Validate XML documents against a compiled schema
    Validate {
        /// Tolerate datatypes the library does not implement, treating
        /// them as unconstrained text
        #[structopt(long = "allow-incomplete-types")]
        allow_incomplete_types: bool,
        /// Suppress warnings about tolerated incomplete types
        #[structopt(short = "q", long = "quiet")]
        quiet: bool,
        /// Compiled schema (JSON)
        schema: PathBuf,
        /// Documents to validate
        xml: Vec<PathBuf>,
    },
}

fn main() {
    match Cli::from_args() {
        Cli::Validate {
            allow_incomplete_types,
            quiet,
            schema,
            xml,
        } => validate(schema, xml, allow_incomplete_types, quiet),
    }
}

fn read_file(path: &PathBuf, what: &str) -> String {
    let mut f = match File::open(path) {
        Ok(f) => f,
        Err(e) => {
            eprintln!("cannot open {what} {path:?}: {e}");
            exit(1);
        }
    };
    let mut content = String::new();
    if let Err(e) = f.read_to_string(&mut content) {
        eprintln!("cannot read {what} {path:?}: {e}");
        exit(1);
    }
    content
}

fn validate(schema: PathBuf, xmls: Vec<PathBuf>, allow_incomplete_types: bool, quiet: bool) {
    let json = read_file(&schema, "schema");
    let options = LoaderOptions {
        allow_incomplete_types,
    };
    let loaded = match load_str(&json, &options) {
        Ok(loaded) => loaded,
        Err(err) => {
            eprintln!("cannot load schema {schema:?}: {err}");
            exit(1);
        }
    };
    if !quiet {
        for name in &loaded.incomplete_types {
            eprintln!("warning: datatype {name:?} is not fully supported; treating it as text");
        }
    }
    for xml in xmls {
        let doc = read_file(&xml, "document");
        let reader = xmlparser::Tokenizer::from(&doc[..]);
        let mut v = Validator::new(&loaded.schema, reader);
        eprintln!("Validating {xml:?}");
        let result = loop {
            match v.validate_next() {
                Some(Ok(())) => {}
                Some(Err(err)) => break Err(err),
                None => break v.finish(),
            }
        };
        if let Err(err) = result {
            let (map, d) = v.diagnostic(xml.to_string_lossy().to_string(), doc.clone(), &err);
            let mut emitter = codemap_diagnostic::Emitter::stderr(
                codemap_diagnostic::ColorConfig::Auto,
                Some(&map),
            );
            emitter.emit(&d[..]);
            exit(2);
        }
    }
}
