#![no_main]
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &str| {
    // Parse and validation errors are fine; panics are not.
    if let Ok(cfg) = toml::from_str::<soil_config::Config>(data) {
        if cfg.validate().is_ok() {
            // a config that validates must also build controller settings
            let settings = soil_core::ControllerSettings::try_from(&cfg);
            assert!(settings.is_ok(), "validated config rejected: {settings:?}");
        }
    }
});
