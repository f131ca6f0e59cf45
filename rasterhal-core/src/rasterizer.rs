//! Rasterizer
//!
//! Top-level owner of the shared object registry, the installed drivers and
//! the driver quirk table. Rasterizers can be linked so that object indices
//! allocated on one are mirrored on its siblings.

use crate::config::RasterizerConfig;
use crate::driver::{DriverCaps, DriverInfo, RasterizerDriver};
use crate::error::Result;
use crate::object::{ObjectKind, ObjectRegistry, SharedRegistry, Slot};
use crate::quirks::{DeviceQuery, DriverProblem, DriverQuirkTable, OsKind};
use std::path::Path;
use std::rc::Rc;

pub struct Rasterizer {
    config: RasterizerConfig,
    registry: SharedRegistry,
    drivers: Vec<RasterizerDriver>,
    quirks: DriverQuirkTable,
}

impl Rasterizer {
    /// Rasterizer without drivers.
    pub fn new(config: RasterizerConfig) -> Self {
        let registry =
            ObjectRegistry::new(config.initial_slots, config.reserved_vertex_buffer_slots)
                .into_shared();
        Self {
            config,
            registry,
            drivers: Vec::new(),
            quirks: DriverQuirkTable::default(),
        }
    }

    /// Rasterizer with the NULL driver installed.
    pub fn start(config: RasterizerConfig) -> Self {
        let mut rasterizer = Self::new(config);
        let registry = rasterizer.registry.clone();
        let driver = RasterizerDriver::null(registry, rasterizer.config.clone());
        rasterizer.drivers.push(driver);
        log::info!(
            "Rasterizer started with {} object slots",
            rasterizer.registry.borrow().len()
        );
        rasterizer
    }

    pub fn config(&self) -> &RasterizerConfig {
        &self.config
    }

    pub fn registry(&self) -> &SharedRegistry {
        &self.registry
    }

    // ── Drivers ─────────────────────────────────────────────────

    /// A driver sharing this rasterizer's registry, ready for [`Self::add_driver`].
    pub fn new_driver(&self, info: DriverInfo, caps: DriverCaps) -> RasterizerDriver {
        RasterizerDriver::new(info, caps, self.registry.clone(), self.config.clone())
    }

    /// Install a driver, restricting it when the quirk table knows a problem
    /// with it on this host. Returns the driver's index.
    pub fn add_driver(&mut self, mut driver: RasterizerDriver) -> usize {
        if let Some(problem) = self.problem_for(&driver, OsKind::current()).cloned() {
            driver.apply_problem(problem);
        }
        self.drivers.push(driver);
        self.drivers.len() - 1
    }

    fn problem_for(&self, driver: &RasterizerDriver, os: OsKind) -> Option<&DriverProblem> {
        let info = driver.info();
        self.quirks.find(&DeviceQuery {
            vendor: &info.vendor,
            renderer: &info.renderer,
            version: &info.version,
            device_desc: &info.description,
            bpp: driver.display_bpp(),
            os,
        })
    }

    pub fn drivers(&self) -> &[RasterizerDriver] {
        &self.drivers
    }

    pub fn driver(&self, index: usize) -> Option<&RasterizerDriver> {
        self.drivers.get(index)
    }

    pub fn driver_mut(&mut self, index: usize) -> Option<&mut RasterizerDriver> {
        self.drivers.get_mut(index)
    }

    // ── Object indices ──────────────────────────────────────────

    pub fn create_object_index(&mut self, kind: ObjectKind) -> Result<Slot> {
        self.registry.borrow_mut().acquire(kind, true)
    }

    /// Release a slot; every context drops its descriptor there, and the
    /// tile textures of a released sprite are released with it.
    pub fn release_object_index(&mut self, slot: Slot, kind: ObjectKind) -> bool {
        let released = self.registry.borrow_mut().release(slot, kind, true);
        for driver in &mut self.drivers {
            driver.settle_contexts();
        }
        released
    }

    // ── Linked rasterizers ──────────────────────────────────────

    /// Mirror object allocations between `self` and `other`, both ways.
    pub fn link(&mut self, other: &Rasterizer) {
        if Rc::ptr_eq(&self.registry, &other.registry) {
            return;
        }
        self.registry.borrow_mut().link(&other.registry);
        other.registry.borrow_mut().link(&self.registry);
        log::debug!("Rasterizers linked");
    }

    pub fn unlink(&mut self, other: &Rasterizer) {
        if Rc::ptr_eq(&self.registry, &other.registry) {
            return;
        }
        self.registry.borrow_mut().unlink(&other.registry);
        other.registry.borrow_mut().unlink(&self.registry);
    }

    pub fn linked_count(&self) -> usize {
        self.registry.borrow().linked_count()
    }

    // ── Driver quirks ───────────────────────────────────────────

    pub fn set_quirk_table(&mut self, quirks: DriverQuirkTable) {
        self.quirks = quirks;
    }

    pub fn quirk_table(&self) -> &DriverQuirkTable {
        &self.quirks
    }

    pub fn load_quirks(&mut self, path: &Path) -> anyhow::Result<()> {
        self.quirks = DriverQuirkTable::load(path)?;
        Ok(())
    }

    /// Problem known for the device at `index` when running on `os`.
    pub fn find_driver_problems(&self, index: usize, os: OsKind) -> Option<&DriverProblem> {
        self.drivers
            .get(index)
            .and_then(|driver| self.problem_for(driver, os))
    }
}

impl std::fmt::Debug for Rasterizer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Rasterizer")
            .field("registry", &self.registry.borrow())
            .field("drivers", &self.drivers)
            .field("quirks", &self.quirks.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::object::ObjectType;

    fn small_config() -> RasterizerConfig {
        RasterizerConfig {
            initial_slots: 32,
            reserved_vertex_buffer_slots: 8,
            ..Default::default()
        }
    }

    #[test]
    fn start_installs_the_null_driver() {
        let rasterizer = Rasterizer::start(small_config());
        assert_eq!(rasterizer.drivers().len(), 1);
        assert_eq!(rasterizer.drivers()[0].info().description, "NULL Rasterizer");
        assert_eq!(rasterizer.registry().borrow().len(), 32);
        assert_eq!(
            rasterizer.registry().borrow().entry(Slot(7)),
            Some(ObjectType::VERTEX_BUFFER)
        );
    }

    #[test]
    fn linking_is_symmetric_and_idempotent() {
        let mut a = Rasterizer::new(small_config());
        let mut b = Rasterizer::new(small_config());
        a.link(&b);
        b.link(&a);
        assert_eq!(a.linked_count(), 1);
        assert_eq!(b.linked_count(), 1);

        let slot = a.create_object_index(ObjectKind::Texture).unwrap();
        assert!(b.registry().borrow().is_occupied(slot, ObjectKind::Texture));

        a.unlink(&b);
        assert_eq!(a.linked_count(), 0);
        assert_eq!(b.linked_count(), 0);
    }

    #[test]
    fn added_drivers_pick_up_known_problems() {
        let mut rasterizer = Rasterizer::start(small_config());
        rasterizer.set_quirk_table(DriverQuirkTable::new(vec![DriverProblem {
            vendor: "ACME".to_string(),
            max_texture_width: 512,
            os: vec![OsKind::current()],
            ..Default::default()
        }]));

        let info = DriverInfo {
            description: "ACME 3D".to_string(),
            vendor: "ACME".to_string(),
            ..Default::default()
        };
        let driver = rasterizer.new_driver(info, DriverCaps::default());
        let index = rasterizer.add_driver(driver);
        assert_eq!(rasterizer.driver(index).unwrap().caps().max_texture_width, 512);
        assert!(rasterizer.find_driver_problems(index, OsKind::current()).is_some());
        assert!(rasterizer.find_driver_problems(0, OsKind::current()).is_none());
    }
}
