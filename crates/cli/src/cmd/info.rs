use anyhow::Result;
use serde::Serialize;

use vsimbuild_lib::config::BuildConfig;
use vsimbuild_lib::flags::{AssembledFlags, assemble};
use vsimbuild_lib::platform::platform_triple;
use vsimbuild_lib::sources::SourceSet;
use vsimbuild_lib::stages::generate;

use crate::GlobalOpts;
use crate::output::{OutputFormat, print_json, print_stat};

#[derive(Serialize)]
struct InfoReport<'a> {
  platform: Option<String>,
  config: &'a BuildConfig,
  flags: AssembledFlags,
  translator: String,
}

pub fn cmd_info(opts: &GlobalOpts, output: OutputFormat) -> Result<()> {
  let config = super::resolve_config(opts)?;
  let flags = assemble(config.toolchain, &config.opt_level, &config.features);
  let sources = SourceSet::discover(&config.src_dirs, &config.build_dir)?;
  let translator = generate::invocation(&config, &flags, &sources).to_string();

  if output.is_json() {
    return print_json(&InfoReport {
      platform: platform_triple(),
      config: &config,
      flags,
      translator,
    });
  }

  println!("System:");
  match platform_triple() {
    Some(triple) => print_stat("Platform", &triple),
    None => print_stat("Platform", "unrecognized"),
  }
  print_stat("Toolchain", config.toolchain.name);
  print_stat("Compiler", &config.compiler);

  println!();
  println!("Build:");
  print_stat("Top module", &config.top_module);
  print_stat("Build dir", &config.build_dir.display().to_string());
  print_stat("Modules dir", &config.modules_dir.display().to_string());
  print_stat("CFLAGS", &flags.cflags_string());
  print_stat("LDFLAGS", &flags.ldflags_string());
  print_stat("Parallelism", &config.parallelism.to_string());

  println!();
  println!("Translator:");
  println!("  {}", translator);
  Ok(())
}
