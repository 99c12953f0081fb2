use winusb_core::logging;
use winusb_installer::ui::style::{self, emoji};

fn main() {
    if let Err(err) = winusb_installer::run() {
        let label = if winusb_core::errors::is_user_abort(&err) {
            emoji::CANCEL
        } else {
            emoji::ERROR
        };
        let message = style::with(label, &format!("{:#}", err));
        eprintln!("{}", message);
        if logging::logs_to_file() {
            log::error!("{}", message);
        }
        std::process::exit(1);
    }
}
