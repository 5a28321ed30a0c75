use crate::dispatcher::{Dispatcher, HandlerResponse};
use crate::runtime_config::BindConfig;
use crate::server::RawRequest;
use crate::spec::{load_router, load_routes, Constraints, LoadError, ParameterSpec, RouteSpec};
use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use http::header::COOKIE;
use http::{HeaderMap, HeaderName, HeaderValue, Method};
use std::io::Write;
use std::path::PathBuf;

/// Command-line interface for brrtbind
///
/// Inspects and checks route files, and binds one request against them.
#[derive(Parser, Debug)]
#[command(name = "brrtbind")]
#[command(about = "Typed HTTP request binding", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

/// Available CLI commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// List the routes and parameters declared in a route file
    Inspect {
        /// Path to the route file (YAML or JSON)
        #[arg(short, long)]
        routes: PathBuf,
    },
    /// Load a route file and report every declaration issue
    Check {
        #[arg(short, long)]
        routes: PathBuf,
    },
    /// Bind one request and print the bound parameters or the error payload
    Bind {
        #[arg(short, long)]
        routes: PathBuf,

        /// HTTP method
        #[arg(short, long, default_value = "GET")]
        method: String,

        /// Request target, e.g. `/items/42?q=foo` (a full URL is accepted)
        #[arg(short, long)]
        url: String,

        /// Request header as `Name: value` (repeatable)
        #[arg(short = 'H', long = "header")]
        headers: Vec<String>,

        /// Cookie as `name=value` (repeatable)
        #[arg(long = "cookie")]
        cookies: Vec<String>,

        /// Request body text
        #[arg(long, conflicts_with = "body_file")]
        body: Option<String>,

        /// Read the request body from a file
        #[arg(long)]
        body_file: Option<PathBuf>,

        /// Content type of the body (default: application/json when a body is given)
        #[arg(long)]
        content_type: Option<String>,
    },
}

/// Parse the process arguments and run the selected command against stdout.
///
/// # Errors
///
/// Returns an error if the route file cannot be read or the request cannot be built.
pub fn run_cli() -> Result<bool> {
    let cli = Cli::parse();
    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    run(cli, &mut out)
}

/// Run a parsed command, writing its report to `out`.
///
/// Returns `Ok(false)` when the command ran but found problems (invalid route file,
/// failed bind), so the binary can exit non-zero.
///
/// # Errors
///
/// Returns an error for I/O failures and malformed command arguments.
pub fn run<W: Write>(cli: Cli, out: &mut W) -> Result<bool> {
    match cli.command {
        Commands::Inspect { routes } => {
            let routes = match load_routes(&routes) {
                Ok(routes) => routes,
                Err(err) => return report_load_error(&err, out),
            };
            for route in &routes {
                write_route(route, out)?;
            }
            Ok(true)
        }
        Commands::Check { routes } => match load_router(&routes) {
            Ok(router) => {
                writeln!(out, "✅ {} route(s) OK", router.len())?;
                Ok(true)
            }
            Err(err) => report_load_error(&err, out),
        },
        Commands::Bind {
            routes,
            method,
            url,
            headers,
            cookies,
            body,
            body_file,
            content_type,
        } => {
            let router = match load_router(&routes) {
                Ok(router) => router,
                Err(err) => return report_load_error(&err, out),
            };
            let body = match (body, body_file) {
                (Some(body), _) => Some(body.into_bytes()),
                (None, Some(path)) => Some(
                    std::fs::read(&path)
                        .with_context(|| format!("Failed to read body file {}", path.display()))?,
                ),
                (None, None) => None,
            };
            let request = build_request(
                &method,
                &url,
                &headers,
                &cookies,
                body,
                content_type.as_deref(),
            )?;

            let mut dispatcher = Dispatcher::with_config(router, BindConfig::from_env());
            let mut names: Vec<String> = dispatcher
                .router()
                .routes()
                .iter()
                .map(|r| r.handler_name.to_string())
                .collect();
            names.sort();
            names.dedup();
            for name in names {
                dispatcher.register_handler(&name, |bound| {
                    HandlerResponse::json(200, bound.to_json())
                });
            }

            let response = dispatcher.dispatch(&request);
            writeln!(out, "{}", serde_json::to_string_pretty(&response.body)?)?;
            Ok(response.status < 400)
        }
    }
}

fn report_load_error<W: Write>(err: &LoadError, out: &mut W) -> Result<bool> {
    match err {
        LoadError::Invalid(issues) => {
            writeln!(out, "❌ {} issue(s) found:", issues.len())?;
            for issue in issues {
                writeln!(out, "{issue}")?;
            }
            Ok(false)
        }
        other => Err(anyhow::anyhow!("{other}")),
    }
}

fn write_route<W: Write>(route: &RouteSpec, out: &mut W) -> Result<()> {
    write!(out, "{route} -> {}", route.handler_name)?;
    if let Some(summary) = &route.summary {
        write!(out, "  # {summary}")?;
    }
    writeln!(out)?;
    for param in &route.parameters {
        writeln!(out, "    {}", describe_param(route, param))?;
    }
    Ok(())
}

fn describe_param(route: &RouteSpec, param: &ParameterSpec) -> String {
    let field = &param.field;
    let mut line = format!(
        "{:<7}{:<16}{}",
        param.location.as_str(),
        param.wire_name(),
        field.value_type
    );
    if field.required {
        line.push_str(" required");
    } else if let Some(default) = &field.default {
        line.push_str(&format!(" default={default}"));
    } else {
        line.push_str(" optional");
    }
    if route.is_embedded(param) {
        line.push_str(" embedded");
    }
    let constraints = describe_constraints(&field.constraints);
    if !constraints.is_empty() {
        line.push_str(&format!(" [{constraints}]"));
    }
    line
}

fn describe_constraints(c: &Constraints) -> String {
    let mut parts = Vec::new();
    for (key, bound) in [("gt", c.gt), ("ge", c.ge), ("lt", c.lt), ("le", c.le)] {
        if let Some(bound) = bound {
            parts.push(format!("{key}={bound}"));
        }
    }
    if let Some(n) = c.min_length {
        parts.push(format!("min_length={n}"));
    }
    if let Some(n) = c.max_length {
        parts.push(format!("max_length={n}"));
    }
    if let Some(re) = &c.pattern {
        parts.push(format!("pattern={}", re.as_str()));
    }
    if let Some(values) = &c.one_of {
        let values: Vec<String> = values.iter().map(ToString::to_string).collect();
        parts.push(format!("one_of={}", values.join("|")));
    }
    parts.join(", ")
}

/// Build a [`RawRequest`] from command-line pieces.
///
/// # Errors
///
/// Returns an error for an unknown method or a malformed header.
pub fn build_request(
    method: &str,
    url: &str,
    headers: &[String],
    cookies: &[String],
    body: Option<Vec<u8>>,
    content_type: Option<&str>,
) -> Result<RawRequest> {
    let method = Method::from_bytes(method.to_ascii_uppercase().as_bytes())
        .with_context(|| format!("Invalid HTTP method: {method}"))?;

    let target = if url.starts_with("http://") || url.starts_with("https://") {
        let parsed = url::Url::parse(url).with_context(|| format!("Invalid URL: {url}"))?;
        match parsed.query() {
            Some(query) => format!("{}?{query}", parsed.path()),
            None => parsed.path().to_string(),
        }
    } else {
        url.to_string()
    };

    let mut map = HeaderMap::new();
    for header in headers {
        let (name, value) = header
            .split_once(':')
            .with_context(|| format!("Header must be 'Name: value', got: {header}"))?;
        let name = HeaderName::from_bytes(name.trim().as_bytes())
            .with_context(|| format!("Invalid header name: {name}"))?;
        let value = HeaderValue::from_str(value.trim())
            .with_context(|| format!("Invalid header value for {name}"))?;
        map.append(name, value);
    }
    if !cookies.is_empty() {
        let value = HeaderValue::from_str(&cookies.join("; ")).context("Invalid cookie")?;
        map.append(COOKIE, value);
    }
    if body.is_some() && !map.contains_key(http::header::CONTENT_TYPE) {
        let value = HeaderValue::from_str(content_type.unwrap_or("application/json"))
            .context("Invalid content type")?;
        map.insert(http::header::CONTENT_TYPE, value);
    }

    let request = RawRequest::new(method, &target).with_headers(map);
    Ok(match body {
        Some(body) => request.with_body(body),
        None => request,
    })
}
