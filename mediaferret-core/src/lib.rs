pub mod crawl;
pub mod model;
pub mod report;

use colored::Colorize;

pub fn print_banner() {
    let banner = r#"
                     _ _        __                    _
  _ __ ___   ___  __| (_) __ _ / _| ___ _ __ _ __ ___| |_
 | '_ ` _ \ / _ \/ _` | |/ _` | |_ / _ \ '__| '__/ _ \ __|
 | | | | | |  __/ (_| | | (_| |  _|  __/ |  | | |  __/ |_
 |_| |_| |_|\___|\__,_|_|\__,_|_|  \___|_|  |_|  \___|\__|
"#;
    println!("{}", banner.bright_cyan());
    println!(
        "  {} v{}\n",
        "media & document discovery crawler".bright_white(),
        env!("CARGO_PKG_VERSION")
    );
}
