use anyhow::Result;
use std::path::PathBuf;

use crate::io;

const DEFAULT_CONFIG: &str = r#"# Analyst reporting pack configuration.
# Every key is optional; the values shown are the defaults.

input_dir: data/in
out_dir: out

currency_code: AUD

report_title: Analyst Reporting Pack
report_subtitle: ""

# A single string or a list; appended to the PDF as "Notes".
notes: []

# Extra column aliases merged over the built-in set
# (sales -> revenue, qty -> units, state -> region, sku -> product, ...).
# Keys are normalized like headers, so punctuation and case do not matter.
aliases: {}

# Output toggles.
make_pdf: true
write_excel_pack: true
write_charts: true
write_cleaned_csv: true
write_quality_report: true
write_run_log: true

# Drop exact whole-row duplicates (true) or only flag them (false).
drop_duplicates: true
"#;

pub fn init_config(force: bool) -> Result<()> {
    let config_path = PathBuf::from("config.yaml");

    if config_path.exists() && !force {
        anyhow::bail!("config.yaml already exists. Use --force to overwrite.");
    }

    io::write_file(&config_path, DEFAULT_CONFIG)?;
    println!("Created config.yaml");

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::DEFAULT_CONFIG;
    use crate::config::AppConfig;

    #[test]
    fn starter_config_parses_to_defaults() {
        let cfg: AppConfig = serde_yaml::from_str(DEFAULT_CONFIG).unwrap();
        let defaults = AppConfig::default();
        assert_eq!(cfg.input_dir, defaults.input_dir);
        assert_eq!(cfg.currency_code, defaults.currency_code);
        assert_eq!(cfg.drop_duplicates, defaults.drop_duplicates);
    }
}
