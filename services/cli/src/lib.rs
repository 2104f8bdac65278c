mod cli;
mod commands;
mod demo;
mod infra;

use nurse_merit::error::AppError;

pub fn run() -> Result<(), AppError> {
    cli::run()
}
