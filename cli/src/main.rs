use {
    armory_staking_cli::{
        clap_app::get_clap_app,
        cli::{parse_args, process_command},
    },
    clap::{crate_description, crate_name, crate_version, ArgMatches},
    solana_clap_utils::DisplayError,
    solana_signer::Signer,
    std::error,
};

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn error::Error>> {
    let matches = get_clap_app(crate_name!(), crate_description!(), crate_version!())
        .get_matches();
    armory_logger::setup_with_default(if matches.is_present("verbose") {
        "info"
    } else {
        "warn"
    });
    do_main(&matches)
        .await
        .map_err(|err| DisplayError::new_as_boxed(err).into())
}

async fn do_main(matches: &ArgMatches<'_>) -> Result<(), Box<dyn error::Error>> {
    let mut wallet_manager = None;
    let (mut config, signers) = parse_args(matches, &mut wallet_manager)?;
    config.signers = signers.iter().map(|s| s.as_ref()).collect::<Vec<&dyn Signer>>();
    let result = process_command(&config).await?;
    println!("{result}");
    Ok(())
}
