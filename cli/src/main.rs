use std::path::{Path, PathBuf};

use clap::{Args, Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use metaforge_client::{FrappeClient, SiteConfig};
use metaforge_core::{FieldGrammar, FieldSpec, parse_field_definitions};
use metaforge_ops::{
    AddFieldsRequest, CreateDoctypeRequest, DEFAULT_MODULE, Dispatcher, OpsError,
    SetPropertyRequest,
};
use metaforge_rest::{ApiReference, DEFAULT_BIND, api_reference};

/// CLI-specific docs format enum with clap argument parsing support.
#[derive(Debug, Clone, Copy, clap::ValueEnum)]
enum DocsFormat {
    Text,
    Json,
}

#[derive(Debug, Parser)]
#[command(name = "metaforge")]
#[command(version)]
#[command(about = "DocType scaffolding for a Frappe site")]
struct Cli {
    /// Path to the site config file (default: ~/.metaforge/site.yaml).
    #[arg(long, global = true)]
    site: Option<PathBuf>,
    /// Enable debug logging on stderr.
    #[arg(short, long, global = true)]
    verbose: bool,
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Create a new DocType with the given field definitions.
    NewDoctype(NewDoctypeArgs),
    /// Add custom fields to an existing DocType.
    AddField(AddFieldArgs),
    /// Create a property override for a DocType or one of its fields.
    SetProperty(SetPropertyArgs),
    /// Print the field-syntax and error-code reference.
    Docs(DocsArgs),
    /// Run the REST API server.
    Serve(ServeArgs),
}

#[derive(Debug, Args)]
struct NewDoctypeArgs {
    /// Name of the DocType to create.
    doctype_name: String,
    /// Field definition (e.g. "email:Data:*:unique"); repeatable.
    #[arg(short, long)]
    fields: Vec<String>,
    /// App or module to create the DocType in (defaults to Custom).
    #[arg(short, long, default_value = DEFAULT_MODULE)]
    module: String,
    /// Mark the DocType as custom regardless of module.
    #[arg(long)]
    custom: bool,
    /// Fail instead of proceeding when no fields are given.
    #[arg(long)]
    no_interact: bool,
    /// Parse and print the would-be DocType without contacting the site.
    #[arg(long)]
    dry_run: bool,
}

#[derive(Debug, Args)]
struct AddFieldArgs {
    /// Name of the existing DocType to customize.
    doctype: String,
    /// Field definition (e.g. "iban:Data:unique"); repeatable.
    #[arg(short, long)]
    fields: Vec<String>,
    /// Place every added field after this existing field.
    #[arg(long)]
    insert_after: Option<String>,
}

#[derive(Debug, Args)]
struct SetPropertyArgs {
    /// Name of the DocType to override a property on.
    doctype: String,
    /// Property to override (e.g. hidden, label, reqd).
    #[arg(long)]
    property: String,
    /// New value for the property.
    #[arg(long)]
    value: String,
    /// Field to apply the override to (omit with --for-doctype).
    #[arg(long)]
    field: Option<String>,
    /// Value type recorded on the override (defaults to Data).
    #[arg(long)]
    property_type: Option<String>,
    /// Apply the override to the DocType itself instead of a field.
    #[arg(long)]
    for_doctype: bool,
}

#[derive(Debug, Args)]
struct DocsArgs {
    /// Output format.
    #[arg(long, default_value = "text")]
    format: DocsFormat,
}

#[derive(Debug, Args)]
struct ServeArgs {
    /// Address to bind, host:port.
    #[arg(long, default_value = DEFAULT_BIND)]
    bind: String,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let site = cli.site.as_deref();
    let result = match cli.command {
        Command::NewDoctype(args) => run_new_doctype(site, args).await,
        Command::AddField(args) => run_add_field(site, args).await,
        Command::SetProperty(args) => run_set_property(site, args).await,
        Command::Docs(args) => run_docs(args),
        Command::Serve(args) => run_serve(site, args).await,
    };

    if let Err(err) = result {
        eprintln!("error: {err}");
        std::process::exit(1);
    }
}

fn init_logging(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new(
            "metaforge=debug,metaforge_client=debug,metaforge_ops=debug,metaforge_rest=debug",
        )
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

async fn run_new_doctype(site: Option<&Path>, args: NewDoctypeArgs) -> Result<(), String> {
    if args.fields.is_empty() {
        if args.no_interact {
            return Err("No fields provided. Use -f or remove --no-interact.".to_string());
        }
        println!("No fields specified. You can add fields later.");
    }

    if args.dry_run {
        return run_dry_run(&args);
    }

    let dispatcher = connect(site)?;
    let created = dispatcher
        .create_doctype(CreateDoctypeRequest {
            doctype_name: args.doctype_name,
            fields: args.fields,
            module: Some(args.module),
            custom: args.custom,
        })
        .await
        .map_err(|err| render_ops_error(&err))?;

    println!(
        "DocType '{}' created in module '{}'.",
        created.doctype_name, created.module
    );
    Ok(())
}

fn run_dry_run(args: &NewDoctypeArgs) -> Result<(), String> {
    let fields = parse_field_definitions(&args.fields, FieldGrammar::Create)
        .map_err(|err| err.to_string())?;

    println!(
        "Dry run: DocType '{}' in module '{}' with {} field(s).",
        args.doctype_name,
        display_module(&args.module),
        fields.len()
    );
    for field in &fields {
        println!("  {}", summarize_field(field));
    }
    Ok(())
}

async fn run_add_field(site: Option<&Path>, args: AddFieldArgs) -> Result<(), String> {
    let dispatcher = connect(site)?;
    let added = dispatcher
        .add_custom_fields(AddFieldsRequest {
            doctype: args.doctype,
            fields: args.fields,
            insert_after: args.insert_after,
        })
        .await
        .map_err(|err| render_ops_error(&err))?;

    for field in &added {
        println!(
            "Custom field '{}' added to '{}'.",
            field.fieldname, field.doctype
        );
    }
    Ok(())
}

async fn run_set_property(site: Option<&Path>, args: SetPropertyArgs) -> Result<(), String> {
    let dispatcher = connect(site)?;
    let set = dispatcher
        .set_property(SetPropertyRequest {
            doctype: args.doctype,
            property: args.property,
            value: serde_json::Value::String(args.value),
            property_type: args.property_type,
            field_name: args.field,
            for_doctype: args.for_doctype,
        })
        .await
        .map_err(|err| render_ops_error(&err))?;

    match set.field_name {
        Some(ref field) => println!(
            "Property '{}' set to '{}' on field '{}' of '{}'.",
            set.property, set.value, field, set.doctype
        ),
        None => println!(
            "Property '{}' set to '{}' on DocType '{}'.",
            set.property, set.value, set.doctype
        ),
    }
    Ok(())
}

fn run_docs(args: DocsArgs) -> Result<(), String> {
    let reference = api_reference();
    match args.format {
        DocsFormat::Json => {
            let json = serde_json::to_string_pretty(&reference)
                .map_err(|err| format!("Failed to serialize reference: {err}"))?;
            println!("{json}");
        }
        DocsFormat::Text => print!("{}", render_reference_text(&reference)),
    }
    Ok(())
}

async fn run_serve(site: Option<&Path>, args: ServeArgs) -> Result<(), String> {
    let dispatcher = connect(site)?;
    metaforge_rest::serve(dispatcher, &args.bind)
        .await
        .map_err(|err| format!("Failed to serve on '{}': {err}", args.bind))
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Resolves the site config and builds a dispatcher around an HTTP client.
fn connect(site: Option<&Path>) -> Result<Dispatcher<FrappeClient>, String> {
    let config = SiteConfig::resolve(site).map_err(|err| err.to_string())?;
    tracing::debug!(url = %config.base_url(), "resolved site profile");
    let client = FrappeClient::new(config).map_err(|err| err.to_string())?;
    Ok(Dispatcher::new(client))
}

/// Formats an operation failure with its follow-up hint, when one exists.
fn render_ops_error(err: &OpsError) -> String {
    match err.hint() {
        Some(hint) => format!("{err}\nhint: {hint}"),
        None => err.to_string(),
    }
}

/// The module a dry run would target, normalized the way dispatch does it.
fn display_module(module: &str) -> &str {
    let trimmed = module.trim();
    if trimmed.is_empty() || trimmed.eq_ignore_ascii_case(DEFAULT_MODULE) {
        DEFAULT_MODULE
    } else {
        trimmed
    }
}

/// One-line description of a parsed field for dry-run output.
fn summarize_field(field: &FieldSpec) -> String {
    let mut notes: Vec<String> = Vec::new();
    if field.required {
        notes.push("required".to_string());
    }
    if field.unique {
        notes.push("unique".to_string());
    }
    if field.read_only {
        notes.push("readonly".to_string());
    }
    if let Some(ref options) = field.options {
        notes.push(format!("options: {options}"));
    }
    if let Some(ref default) = field.default {
        notes.push(format!("default: {default}"));
    }

    if notes.is_empty() {
        format!("{} ({})", field.fieldname, field.fieldtype.as_str())
    } else {
        format!(
            "{} ({}; {})",
            field.fieldname,
            field.fieldtype.as_str(),
            notes.join(", ")
        )
    }
}

/// Renders the reference bundle as indented plain text.
fn render_reference_text(reference: &ApiReference) -> String {
    use std::fmt::Write as _;

    let syntax = &reference.field_syntax;
    let mut out = String::new();

    let _ = writeln!(out, "Field definition syntax (version {}):", syntax.version);
    let _ = writeln!(out, "  {}", syntax.shape);
    let _ = writeln!(out);
    let _ = writeln!(out, "Field types:");
    let _ = writeln!(out, "  {}", syntax.field_types.join(", "));
    let _ = writeln!(out);
    let _ = writeln!(out, "Attributes:");
    for attr in &syntax.attributes {
        let mut token = attr.token.clone();
        if !attr.aliases.is_empty() {
            token = format!("{token} ({})", attr.aliases.join(", "));
        }
        let scope = if attr.customize_only {
            " [add-field only]"
        } else {
            ""
        };
        let _ = writeln!(out, "  {token:<30} {}{scope}", attr.description);
    }
    let _ = writeln!(out);
    let _ = writeln!(out, "Examples:");
    for example in &syntax.examples {
        let _ = writeln!(out, "  {}", example.definition);
        let _ = writeln!(out, "      {}", example.explanation);
    }
    if !syntax.notes.is_empty() {
        let _ = writeln!(out);
        let _ = writeln!(out, "Notes:");
        for note in &syntax.notes {
            let _ = writeln!(out, "  - {note}");
        }
    }
    let _ = writeln!(out);
    let _ = writeln!(out, "REST endpoints:");
    for endpoint in &reference.endpoints {
        let _ = writeln!(
            out,
            "  {:<4} {:<34} {}",
            endpoint.method, endpoint.path, endpoint.description
        );
    }
    let _ = writeln!(out);
    let _ = writeln!(out, "Error codes:");
    for code in &reference.error_codes {
        let _ = writeln!(
            out,
            "  {:<18} {:>3}  {}",
            code.code, code.http_status, code.description
        );
        let _ = writeln!(out, "        fix: {}", code.remedy);
    }
    out
}
