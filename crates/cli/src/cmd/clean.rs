//! Implementation of the `clean` command.

use anyhow::Result;

use vsimbuild_lib::stages::clean::{CleanOutcome, clean};

use crate::GlobalOpts;
use crate::output::{print_info, print_success};

pub fn cmd_clean(opts: &GlobalOpts) -> Result<()> {
  let config = super::resolve_config(opts)?;
  let dir = config.build_dir.display();

  if opts.dry_run {
    println!("rm -rf {}", dir);
    return Ok(());
  }

  match clean(&config)? {
    CleanOutcome::Removed => print_success(&format!("Removed {}", dir)),
    CleanOutcome::AlreadyClean => print_info(&format!("Nothing to clean, {} does not exist", dir)),
  }
  Ok(())
}
