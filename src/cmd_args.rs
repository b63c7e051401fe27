use std::ffi::OsString;

pub use clap::Parser;

#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct ClapArgs {
    /// File containing the query to run. Without it the query is read from
    /// standard input, or an interactive session starts when stdin is a terminal.
    #[clap(value_name = "FILE")]
    file: Option<String>,

    /// Profile name
    /// Profile section to read credentials from. Default is 'default'.
    /// NETSUITE_* environment variables override the profile values.
    #[clap(short = 'p', long, default_value = "default", help = "profile name")]
    profile: String,

    /// Number of results to return
    #[clap(long, allow_negative_numbers = true, help = "Number of results to return")]
    limit: Option<i64>,

    /// Number of results to skip
    #[clap(long, allow_negative_numbers = true, help = "Number of results to skip")]
    offset: Option<i64>,

    /// Compact JSON output
    #[clap(long, help = "Emit compact JSON", default_value = "false")]
    json: bool,

    /// Force the interactive session even when stdin is not a terminal
    #[clap(
        short = 'i',
        long,
        help = "Start an interactive session",
        default_value = "false"
    )]
    interactive: bool,

    /// Verbose mode
    /// Optional. Print verbose messages.
    #[clap(
        short = 'v',
        long,
        help = "Print verbose message",
        default_value = "false"
    )]
    verbose: bool,
}

#[derive(Debug, Clone)]
pub struct CommandLineArgs {
    file: Option<String>,
    profile: String,
    limit: Option<i64>,
    offset: Option<i64>,
    json: bool,
    interactive: bool,
    verbose: bool,
}

impl From<ClapArgs> for CommandLineArgs {
    fn from(args: ClapArgs) -> Self {
        Self {
            file: args.file,
            profile: args.profile,
            limit: args.limit,
            offset: args.offset,
            json: args.json,
            interactive: args.interactive,
            verbose: args.verbose,
        }
    }
}

impl CommandLineArgs {
    pub fn parse() -> Self {
        ClapArgs::parse().into()
    }

    pub fn parse_from<I, T>(itr: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<OsString> + Clone,
    {
        ClapArgs::parse_from(itr).into()
    }

    pub fn file(&self) -> Option<&str> {
        self.file.as_deref()
    }

    pub fn profile(&self) -> &String {
        &self.profile
    }

    pub fn limit(&self) -> Option<i64> {
        self.limit
    }

    pub fn offset(&self) -> Option<i64> {
        self.offset
    }

    pub fn json(&self) -> bool {
        self.json
    }

    pub fn interactive(&self) -> bool {
        self.interactive
    }

    pub fn verbose(&self) -> bool {
        self.verbose
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_default_values() {
        let args = CommandLineArgs::parse_from(["suiteql"]);
        assert_eq!(args.profile(), "default");
        assert_eq!(args.file(), None);
        assert_eq!(args.limit(), None);
        assert_eq!(args.offset(), None);
        assert!(!args.json());
        assert!(!args.interactive());
        assert!(!args.verbose());
    }

    #[test]
    fn test_parse_paging_flags() {
        let args = CommandLineArgs::parse_from(["suiteql", "--limit", "5", "--offset", "10"]);
        assert_eq!(args.limit(), Some(5));
        assert_eq!(args.offset(), Some(10));
    }

    #[test]
    fn test_negative_bounds_reach_validation() {
        let args = CommandLineArgs::parse_from(["suiteql", "--offset", "-3"]);
        assert_eq!(args.offset(), Some(-3));
    }

    #[test]
    fn test_parse_file_and_short_flags() {
        let args = CommandLineArgs::parse_from(["suiteql", "-p", "sandbox", "-i", "-v", "query.sql"]);
        assert_eq!(args.file(), Some("query.sql"));
        assert_eq!(args.profile(), "sandbox");
        assert!(args.interactive());
        assert!(args.verbose());
    }

    #[test]
    fn test_parse_json_flag() {
        let args = CommandLineArgs::parse_from(["suiteql", "--json"]);
        assert!(args.json());
    }
}
