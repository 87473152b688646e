//! Command-line interface for iati-validator

#[cfg(feature = "cli")]
use clap::{ArgAction, Parser, Subcommand};

#[cfg(feature = "cli")]
use std::fs;
#[cfg(feature = "cli")]
use std::path::{Path, PathBuf};

#[cfg(feature = "cli")]
use tracing_subscriber::EnvFilter;

#[cfg(feature = "cli")]
use iati_validator::loaders::Loader;
#[cfg(feature = "cli")]
use iati_validator::{
    full_validation, gated_validation_with_mode, is_xml, Codelist, CodelistMapping, Dataset,
    Limits, ResourceStore, Schema, SchemaKind, ValidationErrorLog, ValidationMode,
    GATED_VALIDATION_MODE,
};

#[cfg(feature = "cli")]
#[derive(Parser, Debug)]
#[command(name = "iati-validator")]
#[command(author, version, about = "Validate IATI XML datasets against Schemas and Codelists", long_about = None)]
struct Cli {
    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[cfg(feature = "cli")]
#[derive(Subcommand, Debug)]
enum Commands {
    /// Validate a dataset
    Validate {
        /// Path to the dataset
        #[arg(value_name = "FILE")]
        file: PathBuf,

        /// Root of the default IATI resources
        #[arg(long, env = "IATI_RESOURCES_DIR", value_name = "DIR")]
        resources: Option<PathBuf>,

        /// Version of the Standard to validate against (defaults to the latest)
        #[arg(long = "standard-version", value_name = "VERSION")]
        standard_version: Option<String>,

        /// XSD to validate against instead of a default schema
        #[arg(short, long, value_name = "SCHEMA", requires = "mapping")]
        schema: Option<PathBuf>,

        /// Codelist mapping file, used with --schema
        #[arg(long, value_name = "MAPPING")]
        mapping: Option<PathBuf>,

        /// Directory of codelist files, used with --schema
        #[arg(long, value_name = "DIR")]
        codelists: Option<PathBuf>,

        /// Only check codelist values, skipping structural validation
        #[arg(long)]
        codelist_only: bool,

        /// Structural validation mode: strict stops at the first problem,
        /// lax (the default) reports all of them
        #[arg(short, long)]
        mode: Option<String>,

        /// Output the error log as JSON
        #[arg(short, long)]
        json: bool,
    },

    /// Check whether a file is well-formed XML
    #[command(name = "check-xml")]
    CheckXml {
        /// Path to the file
        #[arg(value_name = "FILE")]
        file: PathBuf,
    },
}

#[cfg(feature = "cli")]
struct ValidateArgs {
    file: PathBuf,
    resources: Option<PathBuf>,
    standard_version: Option<String>,
    schema: Option<PathBuf>,
    mapping: Option<PathBuf>,
    codelists: Option<PathBuf>,
    codelist_only: bool,
    mode: Option<String>,
    json: bool,
}

#[cfg(feature = "cli")]
fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let result = match cli.command {
        Commands::Validate {
            file,
            resources,
            standard_version,
            schema,
            mapping,
            codelists,
            codelist_only,
            mode,
            json,
        } => cmd_validate(ValidateArgs {
            file,
            resources,
            standard_version,
            schema,
            mapping,
            codelists,
            codelist_only,
            mode,
            json,
        }),
        Commands::CheckXml { file } => cmd_check_xml(file),
    };

    match result {
        Ok(true) => {}
        Ok(false) => std::process::exit(1),
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(2);
        }
    }
}

#[cfg(feature = "cli")]
fn init_tracing(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    // RUST_LOG overrides -v
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("warn,iati_validator={}", level)));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

#[cfg(feature = "cli")]
fn cmd_check_xml(file: PathBuf) -> Result<bool, Box<dyn std::error::Error>> {
    let content = fs::read_to_string(&file)?;
    if is_xml(content.as_str()) {
        println!("{} is well-formed XML", file.display());
        Ok(true)
    } else {
        println!("{} is not well-formed XML", file.display());
        Ok(false)
    }
}

#[cfg(feature = "cli")]
fn cmd_validate(args: ValidateArgs) -> Result<bool, Box<dyn std::error::Error>> {
    let mode: ValidationMode = match &args.mode {
        Some(mode) => mode.to_lowercase().parse()?,
        None => GATED_VALIDATION_MODE,
    };
    let limits = Limits::default();
    let loader = Loader::new().with_limits(limits.clone());

    let content = loader.load(&args.file)?;
    let dataset = match Dataset::with_limits(content, limits.clone()) {
        Ok(dataset) => dataset,
        Err(e) => {
            if args.json {
                println!("{}", serde_json::json!({ "valid": false, "error": e.to_string() }));
            } else {
                println!("{}: {}", args.file.display(), e);
            }
            return Ok(false);
        }
    };

    let (schema, mapping) = match &args.schema {
        Some(path) => explicit_resources(path, &args, &loader)?,
        None => {
            let root = args
                .resources
                .as_ref()
                .ok_or("either --schema or --resources (or IATI_RESOURCES_DIR) is required")?;
            let store = ResourceStore::new(root).with_limits(limits);
            let version = args.standard_version.as_deref();
            let kind = detect_kind(&dataset);
            tracing::info!(schema = %kind, version = version.unwrap_or("latest"), "using default resources");
            (store.schema(kind, version, true)?, store.codelist_mapping(version)?)
        }
    };

    let log = if args.codelist_only {
        full_validation(&dataset, &schema, &mapping)?
    } else {
        gated_validation_with_mode(&dataset, &schema, &mapping, mode)?
    };
    let valid = !log.contains_errors();

    if args.json {
        let report = serde_json::json!({ "valid": valid, "errors": &log });
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_log(&args.file, &log, valid);
    }
    Ok(valid)
}

#[cfg(feature = "cli")]
fn explicit_resources(
    schema_path: &Path,
    args: &ValidateArgs,
    loader: &Loader,
) -> Result<(Schema, CodelistMapping), Box<dyn std::error::Error>> {
    let mut schema = Schema::from_file(schema_path).with_limits(loader.limits().clone());
    if let Some(dir) = &args.codelists {
        for path in loader.list(dir, "xml")? {
            let codelist = Codelist::from_xml_with_limits(&loader.load(&path)?, loader.limits())?;
            schema.add_codelist(codelist);
        }
    }
    let mapping_path = args.mapping.as_ref().ok_or("--mapping is required with --schema")?;
    let mapping = CodelistMapping::from_file(mapping_path, loader)?;
    Ok((schema, mapping))
}

#[cfg(feature = "cli")]
fn detect_kind(dataset: &Dataset) -> SchemaKind {
    match dataset.xml_tree().root_element() {
        Some(root) if root.local_name() == SchemaKind::Organisation.root_element() => {
            SchemaKind::Organisation
        }
        _ => SchemaKind::Activity,
    }
}

#[cfg(feature = "cli")]
fn print_log(file: &Path, log: &ValidationErrorLog, valid: bool) {
    for record in log {
        println!("{}", record);
        if let Some(context) = &record.context {
            for line in context.lines() {
                println!("    | {}", line);
            }
        }
    }
    println!(
        "{}: {} ({} errors, {} warnings)",
        file.display(),
        if valid { "valid" } else { "invalid" },
        log.errors().count(),
        log.warnings().count()
    );
}

#[cfg(not(feature = "cli"))]
fn main() {
    eprintln!("CLI feature not enabled. Rebuild with --features cli");
    std::process::exit(1);
}
