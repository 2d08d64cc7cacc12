use {
    crate::{
        cli::{DEFAULT_CONFIRM_TX_TIMEOUT_SECONDS, DEFAULT_RPC_TIMEOUT_SECONDS},
        pool_info::PoolInfoSubCommands,
        staking::StakingSubCommands,
    },
    clap::{App, AppSettings, Arg},
    solana_clap_utils::input_validators::{is_url_or_moniker, is_valid_pubkey, is_valid_signer},
    solana_cli_config::CONFIG_FILE,
};

pub fn get_clap_app<'ab, 'v>(name: &str, about: &'ab str, version: &'v str) -> App<'ab, 'v> {
    App::new(name)
        .about(about)
        .version(version)
        .setting(AppSettings::SubcommandRequiredElseHelp)
        .arg({
            let arg = Arg::with_name("config_file")
                .short("C")
                .long("config")
                .value_name("FILEPATH")
                .takes_value(true)
                .global(true)
                .help("Configuration file to use");
            if let Some(ref config_file) = *CONFIG_FILE {
                arg.default_value(config_file)
            } else {
                arg
            }
        })
        .arg(
            Arg::with_name("json_rpc_url")
                .short("u")
                .long("url")
                .value_name("URL_OR_MONIKER")
                .takes_value(true)
                .global(true)
                .validator(is_url_or_moniker)
                .help(
                    "URL for Solana's JSON RPC or moniker (or their first letter): \
                     [mainnet-beta, testnet, devnet, localhost]",
                ),
        )
        .arg(
            Arg::with_name("keypair")
                .short("k")
                .long("keypair")
                .value_name("KEYPAIR")
                .global(true)
                .takes_value(true)
                .validator(is_valid_signer)
                .help("Filepath or URL to a keypair paying for and signing transactions"),
        )
        .arg(
            Arg::with_name("commitment")
                .long("commitment")
                .takes_value(true)
                .possible_values(&["processed", "confirmed", "finalized"])
                .value_name("COMMITMENT_LEVEL")
                .hide_possible_values(true)
                .global(true)
                .help(
                    "Return information at the selected commitment level \
                     [possible values: processed, confirmed, finalized]",
                ),
        )
        .arg(
            Arg::with_name("verbose")
                .long("verbose")
                .short("v")
                .global(true)
                .help("Show additional information and enable info logging"),
        )
        .arg(
            Arg::with_name("output_format")
                .long("output")
                .value_name("FORMAT")
                .global(true)
                .takes_value(true)
                .possible_values(&["json", "json-compact"])
                .help("Return information in specified output format"),
        )
        .arg(
            Arg::with_name("program_id")
                .long("program-id")
                .value_name("PROGRAM_ID")
                .global(true)
                .takes_value(true)
                .validator(is_valid_pubkey)
                .help("Address of the staking program [default: the deployed program]"),
        )
        .arg(
            Arg::with_name("reward_mint")
                .long("reward-mint")
                .value_name("MINT_ADDRESS")
                .global(true)
                .takes_value(true)
                .validator(is_valid_pubkey)
                .help("Mint of the reward token [default: the deployed reward mint]"),
        )
        .arg(
            Arg::with_name("rpc_timeout")
                .long("rpc-timeout")
                .value_name("SECONDS")
                .takes_value(true)
                .default_value(DEFAULT_RPC_TIMEOUT_SECONDS)
                .global(true)
                .hidden(true)
                .help("Timeout value for RPC requests"),
        )
        .arg(
            Arg::with_name("confirm_transaction_initial_timeout")
                .long("confirm-timeout")
                .value_name("SECONDS")
                .takes_value(true)
                .default_value(DEFAULT_CONFIRM_TX_TIMEOUT_SECONDS)
                .global(true)
                .hidden(true)
                .help("Timeout value for initial transaction status"),
        )
        .staking_subcommands()
        .pool_info_subcommands()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejects_unknown_output_format() {
        let result = get_clap_app("test", "desc", "version").get_matches_from_safe(vec![
            "test",
            "--output",
            "yaml",
            "global-state",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn test_requires_subcommand() {
        let result = get_clap_app("test", "desc", "version").get_matches_from_safe(vec!["test"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_global_args_after_subcommand() {
        let matches = get_clap_app("test", "desc", "version")
            .get_matches_from_safe(vec!["test", "global-state", "--commitment", "processed"])
            .unwrap();
        assert_eq!(matches.value_of("commitment"), Some("processed"));
    }
}
