#![warn(clippy::all, clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod config;
pub mod context;
pub mod fixtures;
pub mod geom;
pub mod image;
pub mod pipeline;
pub mod plate;

use std::fmt;

use serde::Serialize;
use wasm_bindgen::JsError;
use wasm_bindgen::prelude::*;

pub use config::{ConfigError, ExternalEdge, ReliefRequest};
pub use context::{ContextError, EditRegion, LocalRegion, RegionError};
pub use fixtures::{FixtureError, FixtureId, FixtureRegistry};
pub use image::{HeightImage, ImageError, ImageLibrary};
pub use pipeline::{ReliefError, ReliefReport, build_relief, build_relief_in};
pub use plate::{DEFAULT_PLANE_HEIGHT, Plate, PlateError};

use geom::TriangleMesh;

cfg_if::cfg_if! {
    if #[cfg(all(feature = "console_error_panic_hook", target_arch = "wasm32"))] {
        #[wasm_bindgen(start)]
        pub fn initialize() {
            console_error_panic_hook::set_once();
            init_logger();
        }
    } else {
        #[wasm_bindgen(start)]
        pub fn initialize() {
            // no panic hook without the feature
            init_logger();
        }
    }
}

#[cfg(feature = "debug_logs")]
fn init_logger() {
    use log::LevelFilter;
    use wasm_bindgen_console_logger::DEFAULT_LOGGER;
    if log::set_logger(&DEFAULT_LOGGER).is_ok() {
        log::set_max_level(LevelFilter::Debug);
    }
}

#[cfg(not(feature = "debug_logs"))]
fn init_logger() {
    // logging stays off without `debug_logs`
}

#[macro_export]
macro_rules! debug_log {
    ($($t:tt)*) => {{
        #[cfg(feature = "debug_logs")]
        {
            #[cfg(target_arch = "wasm32")]
            {
                ::web_sys::console::log_1(&::wasm_bindgen::JsValue::from_str(&format!($($t)*)));
            }
            #[cfg(not(target_arch = "wasm32"))]
            {
                println!("{}", format!($($t)*));
            }
        }
    }};
}

#[derive(Debug, Serialize)]
struct FixtureExport {
    name: String,
    /// World-space vertices; empty for text fixtures.
    vertices: Vec<[f64; 3]>,
    faces: Vec<Vec<usize>>,
}

/// Public entry point for browser consumers.
#[wasm_bindgen]
pub struct ReliefEngine {
    images: ImageLibrary,
    fixtures: FixtureRegistry,
    plate: Option<Plate>,
    evaluated: Option<TriangleMesh>,
}

impl Default for ReliefEngine {
    fn default() -> Self {
        Self::new()
    }
}

#[wasm_bindgen]
impl ReliefEngine {
    #[wasm_bindgen(constructor)]
    #[must_use]
    pub fn new() -> ReliefEngine {
        ReliefEngine {
            images: ImageLibrary::new(),
            fixtures: FixtureRegistry::new(),
            plate: None,
            evaluated: None,
        }
    }

    /// Registers an RGBA8 image under `name` (usually its file name).
    #[wasm_bindgen]
    pub fn load_image(&mut self, name: &str, width: u32, height: u32, rgba: &[u8]) -> Result<(), JsValue> {
        let image = HeightImage::from_rgba8(name, width, height, rgba).map_err(to_js_error)?;
        debug_log!("loaded image {name} ({width}x{height})");
        self.images.insert(image);
        Ok(())
    }

    /// Builds a plate named `plate_name` from its matching image and runs the
    /// full pipeline. `request` may be `undefined` for the defaults.
    #[wasm_bindgen]
    pub fn build(&mut self, plate_name: &str, plane_height: f64, request: JsValue) -> Result<JsValue, JsValue> {
        let request: ReliefRequest = if request.is_undefined() || request.is_null() {
            ReliefRequest::default()
        } else {
            serde_wasm_bindgen::from_value(request).map_err(to_js_error)?
        };
        let source = self.images.resolve(plate_name).map_err(to_js_error)?;
        let mut plate = Plate::image_plane(
            plate_name,
            source.image.width(),
            source.image.height(),
            plane_height,
        )
        .map_err(to_js_error)?;

        let report = build_relief(&request, &mut plate, &self.images, &mut self.fixtures)
            .map_err(to_js_error)?;
        let evaluated = plate.evaluated_mesh().map_err(to_js_error)?;
        self.evaluated = Some(evaluated.to_triangle_mesh());
        self.plate = Some(plate);

        serde_wasm_bindgen::to_value(&report).map_err(|err| JsError::new(&err.to_string()).into())
    }

    /// Flat `xyz` buffer of the evaluated solid.
    #[wasm_bindgen]
    #[must_use]
    pub fn positions(&self) -> Vec<f64> {
        self.evaluated
            .as_ref()
            .map(TriangleMesh::positions_flat)
            .unwrap_or_default()
    }

    #[wasm_bindgen]
    #[must_use]
    pub fn indices(&self) -> Vec<u32> {
        self.evaluated
            .as_ref()
            .map(|mesh| mesh.indices.clone())
            .unwrap_or_default()
    }

    #[wasm_bindgen]
    pub fn fixture_names(&self) -> Result<JsValue, JsValue> {
        serde_wasm_bindgen::to_value(&self.fixtures.names())
            .map_err(|err| JsError::new(&err.to_string()).into())
    }

    /// World-space fixture solids at the plate's current transform.
    #[wasm_bindgen]
    pub fn fixtures(&self) -> Result<JsValue, JsValue> {
        let Some(plate) = self.plate.as_ref() else {
            return Err(js_error("no plate has been built yet"));
        };
        let mut exports = Vec::with_capacity(self.fixtures.len());
        for fixture in self.fixtures.iter() {
            let mesh = self
                .fixtures
                .world_mesh(fixture.id, plate)
                .map_err(to_js_error)?;
            exports.push(match mesh {
                Some(mesh) => FixtureExport {
                    name: fixture.name.clone(),
                    vertices: mesh.positions.iter().map(|p| p.to_array()).collect(),
                    faces: mesh.faces().iter().map(|f| f.vertices.clone()).collect(),
                },
                None => FixtureExport {
                    name: fixture.name.clone(),
                    vertices: Vec::new(),
                    faces: Vec::new(),
                },
            });
        }
        serde_wasm_bindgen::to_value(&exports).map_err(|err| JsError::new(&err.to_string()).into())
    }
}

fn to_js_error<E: fmt::Display>(error: E) -> JsValue {
    js_error(&error.to_string())
}

fn js_error(message: &str) -> JsValue {
    #[cfg(target_arch = "wasm32")]
    {
        JsError::new(message).into()
    }
    #[cfg(not(target_arch = "wasm32"))]
    {
        let _ = message;
        JsValue::NULL
    }
}
