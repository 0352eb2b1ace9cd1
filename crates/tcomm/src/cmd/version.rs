use tcomm_frame::PROTOCOL_ALPHA;

use crate::cmd::VersionArgs;
use crate::exit::{CliResult, SUCCESS};

pub fn run(args: VersionArgs) -> CliResult<i32> {
    if !args.extended {
        println!("tcomm {}", env!("CARGO_PKG_VERSION"));
        return Ok(SUCCESS);
    }

    println!("name: tcomm");
    println!("version: {}", env!("CARGO_PKG_VERSION"));
    println!("protocol: {PROTOCOL_ALPHA}");
    println!(
        "target: {}",
        option_env!("TCOMM_BUILD_TARGET").unwrap_or("unknown")
    );
    println!(
        "profile: {}",
        option_env!("TCOMM_BUILD_PROFILE").unwrap_or("unknown")
    );
    println!(
        "features: session={}, fetch={}, cli=true",
        cfg!(feature = "session"),
        cfg!(feature = "fetch")
    );

    Ok(SUCCESS)
}
