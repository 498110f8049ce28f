use std::io;
use std::process::ExitCode;
use std::rc::Rc;

use clap::Parser;
use nbx_adapters::{preflight, Diagnostics, StepEnv};
use nbx_host::{init_dotenv, SystemHost};
use netbox_provision::config::DoctorArgs;
use netbox_provision::console::Console;
use netbox_provision::menu::Menu;
use netbox_provision::{logging, AppError};

fn run(args: DoctorArgs) -> Result<(), AppError> {
    let settings = args.settings.into_settings();
    let host = Rc::new(SystemHost::new());
    preflight(host.as_ref(), &settings)?;
    let env = StepEnv::new(host)?;
    let mut menu = Menu::new(Diagnostics::new(env, settings));
    menu.run(&mut io::stdin().lock(), &mut Console::stdout())?;
    Ok(())
}

fn main() -> ExitCode {
    init_dotenv();
    let args = DoctorArgs::parse();
    logging::init(args.verbose);
    match run(args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            let _ = Console::stderr().error(&e.to_string());
            ExitCode::from(e.exit_code())
        }
    }
}
