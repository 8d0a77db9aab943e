use std::process::ExitCode;

use clap::Parser;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

use xsd_form_compiler::address::Address;
use xsd_form_compiler::bind::bind;
use xsd_form_compiler::cli::Cli;
use xsd_form_compiler::compiler::{Compiler, TracingLog};
use xsd_form_compiler::xsd::{
    default_resolvers, InstanceNamespaces, QName, SchemaIndex, SchemaLoader, SchemaQuery,
    SchemaSet, SchemaSource,
};
use xsd_form_compiler::Error;

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.log_level());
    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) => {
            tracing::error!("{error}");
            ExitCode::FAILURE
        }
    }
}

/// `RUST_LOG` wins over the verbosity flags.
fn init_tracing(level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false)
                .with_filter(filter),
        )
        .init();
}

fn run(cli: &Cli) -> Result<(), Error> {
    let resolvers = default_resolvers();
    let mut loader = SchemaLoader::new(&resolvers).allow_dtd(cli.allow_dtd);
    let main = loader.load(SchemaSource::open(&cli.input)?)?;
    let set = loader.finish();

    let document = set.document(main);
    let namespaces = match &document.target_namespace {
        Some(target) if !cli.no_namespaces => {
            let mut registry = document.namespaces.clone();
            if registry.prefix_for_namespace(target).is_none() {
                registry.register("", target.clone());
            }
            InstanceNamespaces::new(registry, cli.default_prefix.clone())
        }
        _ => InstanceNamespaces::disabled(),
    };
    let root = root_element(&set, main, cli.root.as_deref())?;
    tracing::info!(schema = %cli.input, %root, "compiling");

    let index = SchemaIndex::build(set, namespaces, [&root])?;
    let address = Address::root(index.namespaces().prefixed_name(&root));
    let template = Compiler::new(&index, &TracingLog, cli.mode).compile(&address)?;

    match &cli.instance {
        Some(path) => {
            let text = std::fs::read_to_string(path).map_err(|source| Error::ReadInstance {
                path: path.clone(),
                source,
            })?;
            let options = roxmltree::ParsingOptions {
                allow_dtd: cli.allow_dtd,
                ..roxmltree::ParsingOptions::default()
            };
            let instance = roxmltree::Document::parse_with_options(&text, options)?;
            let form = bind(&template, &instance, index.namespaces())?;
            print!("{form}");
        }
        None => println!("{}", template.to_xml()?),
    }
    Ok(())
}

/// The named global element of the main document, or its first one.
fn root_element(set: &SchemaSet, main: usize, name: Option<&str>) -> Result<QName, Error> {
    let target = set.document(main).target_namespace.clone();
    match name {
        Some(name) => Ok(QName::with_optional_namespace(target, name)),
        None => set
            .global_elements()
            .find(|element| element.document == main)
            .map(|element| element.name.clone())
            .ok_or(Error::NoRootElement),
    }
}
