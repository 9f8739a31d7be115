use bareword::config::{discover_config, read_bareword_toml};
use bareword::trace::DEBUG_TRACE_ENV;
use bareword::{
    analyze_target, expand_target, load_unit, BarewordError, BarewordToml, Mode, OutputFormat,
};
use std::env;
use std::path::PathBuf;
use std::process::ExitCode;

fn main() -> ExitCode {
    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(BarewordError::Diagnostics) => ExitCode::FAILURE,
        Err(err) => {
            eprintln!("{err}");
            ExitCode::FAILURE
        }
    }
}

fn run() -> Result<(), BarewordError> {
    let mut args = env::args().skip(1);
    let Some(command) = args.next() else {
        print_help();
        return Ok(());
    };
    let rest: Vec<String> = args.collect();

    match command.as_str() {
        "-h" | "--help" => {
            print_help();
            Ok(())
        }
        "analyze" => cmd_analyze(&rest),
        "tokens" => cmd_tokens(&rest),
        other => Err(BarewordError::InvalidCommand(other.to_string())),
    }
}

fn print_help() {
    println!(
        "bareword\n\nUSAGE:\n  bareword <COMMAND>\n\nCOMMANDS:\n  analyze [--strict|--permissive] [--json] [--verbose] [--config <file>] [--debug-trace] <path|dir/...>\n  tokens <path>\n\n  -h, --help"
    );
}

#[derive(Debug, Default)]
struct AnalyzeArgs {
    target: Option<String>,
    mode: Option<Mode>,
    json: bool,
    verbose: bool,
    config: Option<PathBuf>,
}

fn parse_analyze_args(args: &[String]) -> Result<AnalyzeArgs, BarewordError> {
    let mut parsed = AnalyzeArgs::default();
    let mut iter = args.iter();
    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "--strict" => parsed.mode = Some(Mode::Strict),
            "--permissive" => parsed.mode = Some(Mode::Permissive),
            "--json" => parsed.json = true,
            "--verbose" => parsed.verbose = true,
            "--config" => {
                let Some(path) = iter.next() else {
                    return Err(BarewordError::InvalidCommand(
                        "--config expects a file path".to_string(),
                    ));
                };
                parsed.config = Some(PathBuf::from(path));
            }
            value if !value.starts_with('-') && parsed.target.is_none() => {
                parsed.target = Some(value.to_string());
            }
            other => {
                return Err(BarewordError::InvalidCommand(format!(
                    "unexpected analyze argument {other}"
                )));
            }
        }
    }
    Ok(parsed)
}

fn load_config(explicit: Option<&PathBuf>) -> Result<BarewordToml, BarewordError> {
    if let Some(path) = explicit {
        return read_bareword_toml(path);
    }
    let cwd = env::current_dir()?;
    match discover_config(&cwd) {
        Some(path) => read_bareword_toml(&path),
        None => Ok(BarewordToml::default()),
    }
}

fn cmd_analyze(args: &[String]) -> Result<(), BarewordError> {
    let (debug_trace, args) = consume_debug_trace_flag(args);
    maybe_enable_debug_trace(debug_trace);
    let args = parse_analyze_args(&args)?;
    let Some(target) = args.target.as_deref() else {
        print_help();
        return Ok(());
    };

    let config = load_config(args.config.as_ref())?;
    let mode = args.mode.unwrap_or(config.analysis.mode);
    let format = if args.json {
        OutputFormat::Json
    } else {
        config.output.format
    };
    let verbose = args.verbose || config.output.verbose;

    let summary = analyze_target(target, mode)?;
    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&summary)?),
        OutputFormat::Text => println!("{}", summary.render(verbose)),
    }
    if summary.has_failures() {
        return Err(BarewordError::Diagnostics);
    }
    Ok(())
}

fn cmd_tokens(args: &[String]) -> Result<(), BarewordError> {
    let Some(target) = args.first() else {
        print_help();
        return Ok(());
    };
    let paths = expand_target(target)?;
    let documents = paths
        .iter()
        .map(|path| load_unit(path).map(|unit| unit.to_document()))
        .collect::<Result<Vec<_>, _>>()?;
    let output = match documents.as_slice() {
        [single] => serde_json::to_string_pretty(single)?,
        _ => serde_json::to_string_pretty(&documents)?,
    };
    println!("{output}");
    Ok(())
}

fn maybe_enable_debug_trace(enabled: bool) {
    if enabled {
        env::set_var(DEBUG_TRACE_ENV, "1");
    }
}

fn consume_debug_trace_flag(args: &[String]) -> (bool, Vec<String>) {
    let mut enabled = false;
    let mut out = Vec::new();
    for arg in args {
        if arg == "--debug-trace" {
            enabled = true;
        } else {
            out.push(arg.clone());
        }
    }
    (enabled, out)
}
