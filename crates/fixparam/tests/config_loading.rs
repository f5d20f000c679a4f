use fixparam::{
    FixparamConfig, Instance, OwnerType, ParamError, ParamValue, Parameter, UnitSystem, UnitTable,
    ValidatorSpec,
};
use std::fs;
use std::sync::Arc;
use tempfile::TempDir;

fn write_config(dir: &TempDir, contents: &str) -> std::path::PathBuf {
    let path = dir.path().join("fixparam.toml");
    fs::write(&path, contents).unwrap();
    path
}

#[test]
fn test_load_without_file_uses_defaults() {
    let config = FixparamConfig::load(None).unwrap();
    assert_eq!(config.default_validator, "default");
    assert!(config.units.is_empty());
}

#[test]
fn test_load_from_file() {
    let dir = TempDir::new().unwrap();
    let path = write_config(
        &dir,
        r#"
default_validator = "float"

[[units]]
symbol = "Rsun"
definition = "6.957e8 m"

[[units]]
symbol = "Jy"
definition = "1e-26 W m^-2 Hz^-1"
prefixable = true
"#,
    );

    let config = FixparamConfig::load(Some(path.as_path())).unwrap();
    assert_eq!(config.default_validator, "float");
    assert_eq!(config.units.len(), 2);
    assert_eq!(config.units[0].symbol, "Rsun");
    assert!(!config.units[0].prefixable);
    assert!(config.units[1].prefixable);
}

#[test]
fn test_invalid_file_is_a_config_error() {
    let dir = TempDir::new().unwrap();
    let path = write_config(&dir, "default_validator = [1, 2");
    let err = FixparamConfig::load(Some(path.as_path())).unwrap_err();
    assert!(matches!(err, ParamError::Config(_)));
}

#[test]
fn test_configured_units_and_validator_drive_parameters() {
    let dir = TempDir::new().unwrap();
    let path = write_config(
        &dir,
        r#"
default_validator = "non-negative"

[[units]]
symbol = "Rsun"
definition = "6.957e8 m"
"#,
    );
    let config = FixparamConfig::load(Some(path.as_path())).unwrap();
    let table: Arc<dyn UnitSystem> = Arc::new(UnitTable::standard_with(&config).unwrap());

    let radius = Parameter::builder_from(&config)
        .unit("km")
        .unit_system(Arc::clone(&table))
        .build()
        .unwrap();
    assert_eq!(radius.fvalidate_spec(), &ValidatorSpec::from("non-negative"));

    let star = Arc::new(OwnerType::new("Star").declare("radius", radius));
    let sun = Instance::new(star);

    let rsun = table.parse_unit("Rsun").unwrap();
    assert!(sun.set("radius", ParamValue::quantity(-1.0, rsun.clone())).is_err());
    sun.set("radius", ParamValue::quantity(1.0, rsun)).unwrap();

    let km = sun.get("radius").unwrap().as_f64().unwrap();
    assert!((km - 695_700.0).abs() < 1e-6);
}

#[test]
fn test_unknown_configured_validator_fails_at_build() {
    let config = FixparamConfig {
        default_validator: "config-missing".into(),
        ..Default::default()
    };
    let err = Parameter::builder_from(&config).build().unwrap_err();
    assert!(matches!(err, ParamError::InvalidValidatorSpec { ref key, .. } if key == "config-missing"));
}

#[test]
fn test_template_parses_back() {
    let template = FixparamConfig::template();
    let parsed: toml::Value = toml::from_str(&template).unwrap();
    assert!(parsed.as_table().is_some());
}
