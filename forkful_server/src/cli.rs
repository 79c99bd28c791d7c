use std::{env, env::VarError};

/// There's no real CLI for the server, so just do quick 'n dirty
pub fn handle_command_line_args() -> bool {
    let has_cli_args = env::args().count() > 1;
    if has_cli_args {
        // We don't expect any CLI args, so always print the help
        display_readme();
        display_envs();
    }
    has_cli_args
}

fn display_readme() {
    const README: &str = include_str!("./cli-help.txt");
    println!("\n{README}\n");
}

fn display_envs() {
    // Be explicit about which envars to print, so as to avoid accidentally exposing secrets
    const DISPLAY_ENVS: [&str; 13] = [
        "RUST_LOG",
        "FDG_HOST",
        "FDG_PORT",
        "FDG_DATABASE_URL",
        "FDG_FRONTEND_URL",
        "FDG_CHECKOUT_API_URL",
        "FDG_CHECKOUT_TIMEOUT_SECS",
        "FDG_WEBHOOK_SIGNATURE_HEADER",
        "FDG_WEBHOOK_SIGNATURE_CHECKS",
        "FDG_TAX_BASIS_POINTS",
        "FDG_FREE_DELIVERY_THRESHOLD_RUPEES",
        "FDG_DELIVERY_FEE_RUPEES",
        "FDG_PENDING_ORDER_TIMEOUT",
    ];

    println!("Current environment values (EXCLUDING variables that contain secrets):");
    DISPLAY_ENVS.iter().for_each(|&name| {
        let val = match env::var(name) {
            Ok(s) => s,
            Err(VarError::NotPresent) => "Not set".into(),
            Err(VarError::NotUnicode(s)) => format!("Invalid value: {}", s.to_string_lossy()),
        };
        println!("  {name:<38} {val:<15}");
    })
}
