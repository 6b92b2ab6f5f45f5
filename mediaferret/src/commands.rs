use clap::{arg, command};

pub const CLAP_STYLING: clap::builder::styling::Styles = clap::builder::styling::Styles::styled()
    .header(clap_cargo::style::HEADER)
    .usage(clap_cargo::style::USAGE)
    .literal(clap_cargo::style::LITERAL)
    .placeholder(clap_cargo::style::PLACEHOLDER)
    .error(clap_cargo::style::ERROR)
    .valid(clap_cargo::style::VALID)
    .invalid(clap_cargo::style::INVALID);

pub(crate) fn command_argument_builder() -> clap::Command {
    clap::Command::new("mediaferret")
        .version(env!("CARGO_PKG_VERSION"))
        .bin_name("mediaferret")
        .styles(CLAP_STYLING)
        .arg(arg!(-q --"quiet" "Suppress banner and non-essential output").required(false))
        .subcommand_required(false)
        .subcommand(
            command!("crawl")
                .about(
                    "Crawl a website for downloadable media and document files, following \
                links up to a bounded depth.",
                )
                .arg(
                    arg!(-u --"url" <URL>)
                        .required(true)
                        .help("The seed URL to crawl from"),
                )
                .arg(
                    arg!(-e --"extensions" <LIST>)
                        .required(true)
                        .help("Comma-separated list of file extensions to collect, e.g. 'pdf,mp4'"),
                )
                .arg(
                    arg!(-d --"depth" <DEPTH>)
                        .required(false)
                        .help("Maximum link hops from the seed page (0 = seed page only)")
                        .value_parser(clap::value_parser!(usize))
                        .default_value("0"),
                )
                .arg(
                    arg!(-t --"threads" <NUM_WORKERS>)
                        .required(false)
                        .help("The number of async worker 'threads' in the worker pool.")
                        .value_parser(clap::value_parser!(usize))
                        .default_value("8"),
                )
                .arg(
                    arg!(--"deadline" <SECS>)
                        .required(false)
                        .help("Overall wall-clock budget for the traversal phase, in seconds")
                        .value_parser(clap::value_parser!(u64))
                        .default_value("120"),
                )
                .arg(
                    arg!(--"min-size" <SIZE>)
                        .required(false)
                        .help("Drop files smaller than this, e.g. '500KB' or '2MB'"),
                )
                .arg(
                    arg!(--"max-size" <SIZE>)
                        .required(false)
                        .help("Drop files larger than this, e.g. '100MB'"),
                )
                .arg(
                    arg!(-o --"output" <PATH>)
                        .required(false)
                        .help("Save report to file (default: display to screen)")
                        .value_parser(clap::value_parser!(std::path::PathBuf)),
                )
                .arg(
                    arg!(-f --"format" <FORMAT>)
                        .required(false)
                        .help("Report format: text, json, csv")
                        .value_parser(["text", "json", "csv"])
                        .default_value("text"),
                ),
        )
}
