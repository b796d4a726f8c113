use crate::config::Spec;
use color_eyre::eyre::WrapErr;
use color_eyre::Result;
use log::info;
use std::fs::File;
use std::path::Path;

/// Load and parse a topology spec from a YAML file
pub fn load_spec(spec_path: &Path) -> Result<Spec> {
    info!("Loading topology spec from: {:?}", spec_path);

    // Open the spec file
    let file = File::open(spec_path)
        .wrap_err_with(|| format!("Failed to open spec file '{}'", spec_path.display()))?;

    // Parse the YAML content
    let spec: Spec = serde_yaml::from_reader(file)
        .wrap_err_with(|| format!("Failed to parse spec file '{}'", spec_path.display()))?;

    // Validate the surface structure
    spec.validate()?;

    info!("Loaded spec with {} node(s)", spec.nodes.len());

    Ok(spec)
}
