use std::env;
use std::process::exit;

use log::{LevelFilter, Log, Metadata, Record};
use prefix_regex::{MalformedPatternError, Node, PatternTree, PrefixValidator, Sequence};

const USAGE: &str = "\
Usage: prefix_check [OPTIONS] <PATTERN> <CANDIDATE>...

Options:
  --repetition-limit <N>  cap additional repetitions per quantifier
  --tree                  print the token tree instead of validating
  -v, --verbose           log every checkpoint to stderr
  -h, --help              print this help";

const EXIT_INVALID: i32 = 1;
const EXIT_USAGE: i32 = 2;

struct StderrLogger;

impl Log for StderrLogger {
    fn enabled(&self, _: &Metadata) -> bool {
        true
    }

    fn log(&self, record: &Record) {
        eprintln!("{:<5} {}", record.level(), record.args());
    }

    fn flush(&self) {}
}

static LOGGER: StderrLogger = StderrLogger;

#[derive(Debug, Default)]
struct Options {
    repetition_limit: Option<usize>,
    print_tree: bool,
    verbose: bool,
    pattern: String,
    candidates: Vec<String>,
}

fn parse_args(mut args: impl Iterator<Item = String>) -> Result<Options, String> {
    let mut options = Options::default();
    let mut positional = Vec::new();

    while let Some(arg) = args.next() {
        match arg.as_str() {
            "-h" | "--help" => {
                println!("{USAGE}");
                exit(0);
            }
            "-v" | "--verbose" => options.verbose = true,
            "--tree" => options.print_tree = true,
            "--repetition-limit" => {
                let value = args
                    .next()
                    .ok_or("--repetition-limit expects a value")?;
                let limit = value
                    .parse()
                    .map_err(|_| format!("invalid repetition limit: {value}"))?;
                options.repetition_limit = Some(limit);
            }
            "--" => positional.extend(args.by_ref()),
            flag if flag.starts_with("--") => Err(format!("unknown option: {flag}"))?,
            _ => positional.push(arg),
        }
    }

    let mut positional = positional.into_iter();
    options.pattern = positional.next().ok_or("missing <PATTERN>")?;
    options.candidates = positional.collect();
    if options.candidates.is_empty() && !options.print_tree {
        Err("missing <CANDIDATE>")?;
    }

    Ok(options)
}

fn format_pattern_error(error: &MalformedPatternError, pattern: &str) -> String {
    let mut message = format!("Error: {}\n{pattern}\n", error.kind());
    message.push_str(&" ".repeat(error.position()));
    message.push('^');
    message
}

fn render_sequence(sequence: &Sequence, depth: usize, out: &mut String) {
    let indent = "  ".repeat(depth);
    for element in sequence.elements() {
        let quantifier = element
            .quantifier()
            .map(|q| match q.max() {
                Some(max) => format!(" repeated {}..={max}", q.min()),
                None => format!(" repeated {}..", q.min()),
            })
            .unwrap_or_default();
        match element.node() {
            Node::Literal(text) => out.push_str(&format!("{indent}literal {text}{quantifier}\n")),
            Node::CharClass(raw) => out.push_str(&format!("{indent}class {raw}{quantifier}\n")),
            Node::Group(body) => {
                out.push_str(&format!("{indent}group{quantifier}\n"));
                render_sequence(body, depth + 1, out);
            }
        }
    }
}

fn render_tree(tree: &PatternTree) -> String {
    let mut out = format!("{}\n", tree.to_pattern_string());
    render_sequence(tree.root(), 1, &mut out);
    out
}

fn main() {
    let options = match parse_args(env::args().skip(1)) {
        Ok(options) => options,
        Err(err) => {
            eprintln!("{err}\n\n{USAGE}");
            exit(EXIT_USAGE);
        }
    };

    if options.verbose && log::set_logger(&LOGGER).is_ok() {
        log::set_max_level(LevelFilter::Trace);
    }

    let body = prefix_regex::strip_delimiters(&options.pattern);
    let tree = match prefix_regex::tokenize(body) {
        Ok(tree) => tree,
        Err(err) => {
            eprintln!("{}", format_pattern_error(&err, body));
            exit(EXIT_USAGE);
        }
    };

    if options.print_tree {
        print!("{}", render_tree(&tree));
        return;
    }

    let mut validator = PrefixValidator::new();
    if let Some(limit) = options.repetition_limit {
        validator = validator.with_repetition_limit(limit);
    }

    let mut all_valid = true;
    for candidate in &options.candidates {
        match validator.is_prefix_valid(&tree, candidate.as_str()) {
            Ok(is_valid) => {
                all_valid &= is_valid;
                println!("{candidate}\t{}", if is_valid { "valid" } else { "invalid" });
            }
            Err(err) => {
                eprintln!("Internal error: {err}");
                exit(EXIT_USAGE);
            }
        }
    }

    if !all_valid {
        exit(EXIT_INVALID);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(line: &[&str]) -> impl Iterator<Item = String> {
        line.iter().map(|s| s.to_string()).collect::<Vec<_>>().into_iter()
    }

    #[test]
    fn parses_options_and_positionals() {
        // when
        let options =
            parse_args(args(&["-v", "--repetition-limit", "3", "/te?s/", "ts", "x"])).unwrap();

        // then
        assert!(options.verbose);
        assert_eq!(options.repetition_limit, Some(3));
        assert_eq!(options.pattern, "/te?s/");
        assert_eq!(options.candidates, vec!["ts", "x"]);
    }

    #[test]
    fn tree_mode_needs_no_candidate() {
        // when
        let options = parse_args(args(&["--tree", "a+"])).unwrap();

        // then
        assert!(options.print_tree);
        assert!(options.candidates.is_empty());
    }

    #[test]
    fn rejects_bad_usage() {
        assert!(parse_args(args(&["abc"])).is_err());
        assert!(parse_args(args(&["--repetition-limit", "x", "a", "b"])).is_err());
        assert!(parse_args(args(&["--bogus", "a", "b"])).is_err());
    }

    #[test]
    fn tree_listing_shows_repetition_bounds() {
        // given
        let tree = prefix_regex::tokenize("a(b[0-9]+)?").unwrap();

        // when
        let listing = render_tree(&tree);

        // then
        let expected = [
            "a(b([0-9]){1,}){0,1}",
            "  literal a",
            "  group repeated 0..=1",
            "    literal b",
            "    group repeated 1..",
            "      class [0-9]",
        ];
        assert_eq!(listing.lines().collect::<Vec<_>>(), expected);
    }

    #[test]
    fn pattern_error_points_at_position() {
        // given
        let err = prefix_regex::tokenize("ab(*").unwrap_err();

        // when
        let message = format_pattern_error(&err, "ab(*");

        // then
        assert_eq!(message.lines().last(), Some("   ^"));
    }
}
