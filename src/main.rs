use std::process::ExitCode;
use std::rc::Rc;

use clap::Parser;
use netbox_provision::config::InstallArgs;
use netbox_provision::console::Console;
use netbox_provision::install::{finish, install};
use netbox_provision::logging;
use nbx_host::{init_dotenv, SystemHost};

fn main() -> ExitCode {
    init_dotenv();
    let args = InstallArgs::parse();
    logging::init(args.verbose);

    let settings = args.settings.into_settings();
    let mut console = Console::stdout();
    match install(Rc::new(SystemHost::new()), settings, &args.lock_file, &mut console).and_then(finish) {
        Ok(()) => {
            let _ = console.success("NetBox installation complete");
            ExitCode::SUCCESS
        }
        Err(e) => {
            let _ = Console::stderr().error(&e.to_string());
            ExitCode::from(e.exit_code())
        }
    }
}
