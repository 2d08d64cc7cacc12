macro_rules! ACCOUNT_STRING {
    () => {
        r#" Address is one of:
  * a base58-encoded public key
  * a path to a keypair file
  * a hyphen; signals a JSON-encoded keypair on stdin
  * the 'ASK' keyword; to recover a keypair via its seed phrase
  * a hardware wallet keypair URL (i.e. usb://ledger)"#
    };
}

macro_rules! pubkey {
    ($arg:expr, $help:expr) => {
        $arg.takes_value(true)
            .validator(is_valid_pubkey)
            .help(concat!($help, ACCOUNT_STRING!()))
    };
}

pub mod checks;
pub mod clap_app;
pub mod cli;
pub mod pool_info;
pub mod staking;
pub mod token_accounts;
pub mod transaction_utils;

#[cfg(test)]
mod test_utils;
