//! Argument vector for the subtitle extraction tool (yt-dlp flag set)

use crate::config::ExtractorConfig;
use crate::process::Invocation;

use super::request::ValidatedRequest;

/// Build the invocation for one validated request.
///
/// Operator `program_args` come first, then the fixed flag set, then `--`
/// and the URL as a single trailing token.
pub fn build_invocation(config: &ExtractorConfig, request: &ValidatedRequest) -> Invocation {
    let mut args = Vec::with_capacity(config.program_args.len() + 8);
    args.extend(config.program_args.iter().cloned());
    args.extend(
        [
            "--skip-download",
            "--write-auto-subs",
            "--sub-langs",
        ]
        .map(String::from),
    );
    args.push(request.languages.join(","));
    args.extend(["--output", "-", "--"].map(String::from));
    args.push(request.url.clone());

    Invocation {
        program: config.program.clone(),
        args,
    }
}
