pub mod host;
pub mod runner;

pub use host::{container_viewport, find_container, mount, random_seed, MountedEffect};
pub use runner::EffectRunner;

use confetti_engine::Effect;

/// An effect that the exported mount functions can build on their own,
/// optionally from a JSON config string handed over by the page.
pub trait MountableEffect: Effect + Sized + 'static {
    type Error: std::fmt::Display;

    fn from_config(json: Option<&str>) -> Result<Self, Self::Error>;

    /// Fixed seed for the random stream, if the configuration pins one.
    fn seed(&self) -> Option<u64> {
        None
    }
}

/// Generate the `#[wasm_bindgen]` exports for an effect.
///
/// # Usage
///
/// ```ignore
/// use wasm_bindgen::prelude::*;
///
/// mod field;
/// use field::ParticleField;
///
/// confetti_web::export_effect!(ParticleField, "particle-field");
/// ```
///
/// Generated exports:
/// - `effect_mount(container_id) -> bool`
/// - `effect_mount_with_config(container_id, config_json) -> bool`
/// - `effect_mounted_count() -> u32`
/// - `effect_unmount_all()`
///
/// Every container gets its own independent effect instance. Mounting onto a
/// container that is missing, has no area, or already carries the effect
/// returns `false`.
#[macro_export]
macro_rules! export_effect {
    ($effect_type:ty, $effect_name:literal) => {
        thread_local! {
            static MOUNTED: std::cell::RefCell<Vec<$crate::MountedEffect>> =
                std::cell::RefCell::new(Vec::new());
        }

        fn mount_by_id(container_id: &str, config: Option<&str>) -> Result<bool, JsValue> {
            console_error_panic_hook::set_once();
            let _ = console_log::init_with_level(log::Level::Info);

            let Some(container) = $crate::find_container(container_id)? else {
                log::info!("{}: no element #{}, skipping", $effect_name, container_id);
                return Ok(false);
            };
            let already = MOUNTED.with(|cell| {
                cell.borrow().iter().any(|m| m.is_mounted_on(&container))
            });
            if already {
                log::info!("{}: #{} already mounted", $effect_name, container_id);
                return Ok(false);
            }

            let effect = <$effect_type as $crate::MountableEffect>::from_config(config)
                .map_err(|err| JsValue::from_str(&err.to_string()))?;
            let seed = $crate::MountableEffect::seed(&effect).unwrap_or_else($crate::random_seed);

            match $crate::mount(&container, effect, seed)? {
                Some(mounted) => {
                    MOUNTED.with(|cell| cell.borrow_mut().push(mounted));
                    log::info!("{}: mounted on #{}", $effect_name, container_id);
                    Ok(true)
                }
                None => Ok(false),
            }
        }

        #[wasm_bindgen]
        pub fn effect_mount(container_id: &str) -> Result<bool, JsValue> {
            mount_by_id(container_id, None)
        }

        #[wasm_bindgen]
        pub fn effect_mount_with_config(
            container_id: &str,
            config_json: &str,
        ) -> Result<bool, JsValue> {
            mount_by_id(container_id, Some(config_json))
        }

        #[wasm_bindgen]
        pub fn effect_mounted_count() -> u32 {
            MOUNTED.with(|cell| cell.borrow().len() as u32)
        }

        #[wasm_bindgen]
        pub fn effect_unmount_all() {
            let mounted = MOUNTED.with(|cell| std::mem::take(&mut *cell.borrow_mut()));
            for effect in mounted {
                effect.unmount();
            }
        }
    };
}
