//! Command-line surface.
//!
//! ```text
//! fromscratch [OPTION]...
//!   -p, --portable [DIRECTORY]  run in portable mode, saving data in ./userdata or DIRECTORY
//!   -h, --help                  show this usage text
//! ```

use clap::Parser;

use crate::storage::PortableMode;

#[derive(Debug, Parser)]
#[command(name = "fromscratch")]
#[command(about = "A single-document scratchpad that keeps your notes between runs")]
pub struct LaunchArgs {
    /// Run in portable mode, saving data in ./userdata, or in DIRECTORY when given
    #[arg(
        short,
        long,
        value_name = "DIRECTORY",
        num_args = 0..=1,
        default_missing_value = ""
    )]
    pub portable: Option<String>,
}

impl LaunchArgs {
    /// Parses the process arguments; prints usage and exits on `--help` or a
    /// bad flag.
    pub fn from_process() -> Self {
        Self::parse()
    }

    pub fn portable_mode(&self) -> PortableMode {
        PortableMode::from_flag(self.portable.as_deref())
    }
}
