use serde::Serialize;
use stemma::options::{ANCESTOR_COUNT_CAP, DESCENDANT_COUNT_CAP};
use stemma::{FixedCardMeasurer, Kinship, Pedigree, StemmaConfig};
use std::io::Read;

#[derive(Debug)]
enum CliError {
    Usage(&'static str),
    Io(std::io::Error),
    Stemma(stemma::Error),
    Json(serde_json::Error),
    NoFulcrum,
}

impl std::fmt::Display for CliError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CliError::Usage(msg) => write!(f, "{msg}"),
            CliError::Io(err) => write!(f, "I/O error: {err}"),
            CliError::Stemma(err) => write!(f, "{err}"),
            CliError::Json(err) => write!(f, "JSON error: {err}"),
            CliError::NoFulcrum => write!(
                f,
                "No fulcrum given: pass --fulcrum <id> or set \"fulcrum\" in the pedigree"
            ),
        }
    }
}

impl From<std::io::Error> for CliError {
    fn from(value: std::io::Error) -> Self {
        Self::Io(value)
    }
}

impl From<stemma::Error> for CliError {
    fn from(value: stemma::Error) -> Self {
        Self::Stemma(value)
    }
}

impl From<serde_json::Error> for CliError {
    fn from(value: serde_json::Error) -> Self {
        Self::Json(value)
    }
}

#[derive(Debug, Clone, Copy, Default)]
enum Command {
    #[default]
    Layout,
    Counts,
}

/// Flags that override values from the configuration file.
#[derive(Debug, Default)]
struct Overrides {
    ancestors: Option<u32>,
    descendants: Option<u32>,
    siblings: Option<u32>,
    uncles: Option<u32>,
    great_uncles: Option<u32>,
    family_index: Option<usize>,
    max_bitmap_size: Option<f64>,
    no_spouses: bool,
    right_to_left: bool,
}

#[derive(Debug, Default)]
struct Args {
    command: Command,
    input: Option<String>,
    pretty: bool,
    fulcrum: Option<String>,
    config: Option<String>,
    overrides: Overrides,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct CountsOut<'a> {
    fulcrum: &'a str,
    ancestors: usize,
    descendants: usize,
    ancestor_cap: usize,
    descendant_cap: usize,
}

fn usage() -> &'static str {
    "stemma-cli\n\
\n\
USAGE:\n\
  stemma-cli [layout] [--pretty] [--fulcrum <id>] [--ancestors <n>] [--descendants <n>] [--siblings <n>] [--uncles <n>] [--great-uncles <n>] [--no-spouses] [--right-to-left] [--family <n>] [--max-bitmap <n>] [--config <path>] [<path>|-]\n\
  stemma-cli counts [--pretty] [--fulcrum <id>] [<path>|-]\n\
\n\
NOTES:\n\
  - If <path> is omitted or '-', the pedigree JSON is read from stdin.\n\
  - --fulcrum defaults to the pedigree's own \"fulcrum\" field.\n\
  - --config reads a JSON object with optional \"diagram\" and \"layout\" sections; flags win.\n\
  - layout prints the diagram layout as JSON; counts prints capped ancestor/descendant counts.\n\
  - Exit codes: 2 for usage errors, 3 when the fulcrum is missing or unknown, 1 otherwise.\n\
"
}

fn next_value<'a>(it: &mut impl Iterator<Item = &'a String>) -> Result<&'a String, CliError> {
    it.next().ok_or(CliError::Usage(usage()))
}

fn parse_num<T: std::str::FromStr>(raw: &str) -> Result<T, CliError> {
    raw.parse::<T>().map_err(|_| CliError::Usage(usage()))
}

fn parse_args(argv: &[String]) -> Result<Args, CliError> {
    let mut args = Args::default();

    let mut it = argv.iter().skip(1);
    while let Some(a) = it.next() {
        match a.as_str() {
            "--help" | "-h" => return Err(CliError::Usage(usage())),
            "layout" => args.command = Command::Layout,
            "counts" => args.command = Command::Counts,
            "--pretty" => args.pretty = true,
            "--fulcrum" => args.fulcrum = Some(next_value(&mut it)?.clone()),
            "--config" => args.config = Some(next_value(&mut it)?.clone()),
            "--ancestors" => args.overrides.ancestors = Some(parse_num(next_value(&mut it)?)?),
            "--descendants" => {
                args.overrides.descendants = Some(parse_num(next_value(&mut it)?)?);
            }
            "--siblings" => args.overrides.siblings = Some(parse_num(next_value(&mut it)?)?),
            "--uncles" => args.overrides.uncles = Some(parse_num(next_value(&mut it)?)?),
            "--great-uncles" => {
                args.overrides.great_uncles = Some(parse_num(next_value(&mut it)?)?);
            }
            "--family" => args.overrides.family_index = Some(parse_num(next_value(&mut it)?)?),
            "--max-bitmap" => {
                let size: f64 = parse_num(next_value(&mut it)?)?;
                if !(size.is_finite() && size > 0.0) {
                    return Err(CliError::Usage(usage()));
                }
                args.overrides.max_bitmap_size = Some(size);
            }
            "--no-spouses" => args.overrides.no_spouses = true,
            "--right-to-left" => args.overrides.right_to_left = true,
            "--" => {
                if let Some(rest) = it.next() {
                    if args.input.is_some() {
                        return Err(CliError::Usage(usage()));
                    }
                    args.input = Some(rest.clone());
                }
                if it.next().is_some() {
                    return Err(CliError::Usage(usage()));
                }
            }
            other if other.starts_with('-') && other != "-" => {
                return Err(CliError::Usage(usage()));
            }
            path => {
                if args.input.is_some() {
                    return Err(CliError::Usage(usage()));
                }
                args.input = Some(path.to_string());
            }
        }
    }

    Ok(args)
}

fn read_input(input: Option<&str>) -> Result<String, CliError> {
    match input {
        None | Some("-") => {
            let mut buf = String::new();
            std::io::stdin().read_to_string(&mut buf)?;
            Ok(buf)
        }
        Some(path) => Ok(std::fs::read_to_string(path)?),
    }
}

fn write_json(value: &impl Serialize, pretty: bool) -> Result<(), CliError> {
    if pretty {
        serde_json::to_writer_pretty(std::io::stdout().lock(), value)?;
    } else {
        serde_json::to_writer(std::io::stdout().lock(), value)?;
    }
    println!();
    Ok(())
}

fn load_config(path: Option<&str>, overrides: &Overrides) -> Result<StemmaConfig, CliError> {
    let mut config = match path {
        Some(path) => StemmaConfig::from_json(&std::fs::read_to_string(path)?)?,
        None => StemmaConfig::default(),
    };

    let diagram = &mut config.diagram;
    if let Some(v) = overrides.ancestors {
        diagram.ancestors = v;
    }
    if let Some(v) = overrides.descendants {
        diagram.descendants = v;
    }
    if let Some(v) = overrides.siblings {
        diagram.siblings = v;
    }
    if let Some(v) = overrides.uncles {
        diagram.uncles = v;
    }
    if let Some(v) = overrides.great_uncles {
        diagram.great_uncles = v;
    }
    if let Some(v) = overrides.family_index {
        diagram.family_index = v;
    }
    if overrides.no_spouses {
        diagram.show_spouses = false;
    }
    if overrides.right_to_left {
        diagram.left_to_right = false;
    }
    if let Some(v) = overrides.max_bitmap_size {
        config.layout.max_bitmap_size = v;
    }
    Ok(config)
}

fn run(args: Args) -> Result<(), CliError> {
    let text = read_input(args.input.as_deref())?;
    let pedigree = Pedigree::from_json(&text)?;
    let fulcrum = args
        .fulcrum
        .clone()
        .or_else(|| pedigree.fulcrum.clone())
        .ok_or(CliError::NoFulcrum)?;

    match args.command {
        Command::Layout => {
            let config = load_config(args.config.as_deref(), &args.overrides)?;
            let layout = stemma::layout(
                &pedigree,
                &fulcrum,
                &config.diagram,
                &config.layout,
                &FixedCardMeasurer::default(),
            )?;
            write_json(&layout, args.pretty)
        }
        Command::Counts => {
            let kin = Kinship::new(&pedigree)?;
            let person = kin
                .person_index(&fulcrum)
                .ok_or_else(|| stemma::Error::UnknownFulcrum {
                    id: fulcrum.clone(),
                })?;
            let out = CountsOut {
                fulcrum: &fulcrum,
                ancestors: kin.count_ancestors(person, ANCESTOR_COUNT_CAP),
                descendants: kin.count_descendants(person, DESCENDANT_COUNT_CAP),
                ancestor_cap: ANCESTOR_COUNT_CAP,
                descendant_cap: DESCENDANT_COUNT_CAP,
            };
            write_json(&out, args.pretty)
        }
    }
}

fn main() {
    let args = match parse_args(&std::env::args().collect::<Vec<_>>()) {
        Ok(v) => v,
        Err(CliError::Usage(msg)) => {
            eprintln!("{msg}");
            std::process::exit(2);
        }
        Err(err) => {
            eprintln!("{err}");
            std::process::exit(1);
        }
    };

    match run(args) {
        Ok(()) => {}
        Err(
            err @ (CliError::NoFulcrum
            | CliError::Stemma(stemma::Error::UnknownFulcrum { .. })),
        ) => {
            eprintln!("{err}");
            std::process::exit(3);
        }
        Err(err) => {
            eprintln!("{err}");
            std::process::exit(1);
        }
    }
}
