//! GPIO port adapter for the ESP-IDF host layer.
//!
//! The only module that touches actual pins. On ESP-IDF it drives the
//! raw `esp-idf-sys` GPIO and ISR-service calls; on the host target the
//! hardware half is simulated in-memory so the crate builds and the
//! lifecycle can be exercised without a board.
//!
//! Claim/publish bookkeeping is kept behind a critical-section mutex:
//! the port is reached from both the edge-dispatch and control-channel
//! contexts. The lock covers only that bookkeeping; host-layer FFI calls
//! (pin configuration, ISR-service installation) and log writes run
//! after it is released, so interrupts are never held off during setup.
//! The one exception is `set_value`, where the single register store
//! stays inside the lock to keep the cached level and the pin in step.
//!
//! Two host-layer quirks worth knowing:
//! - the SoC has no per-pin hardware debounce, so `set_debounce` only
//!   records the window; the edge watcher enforces it in software;
//! - `publish` has no sysfs-style side channel here, so published lines
//!   are tracked and logged for diagnostics only.

use core::cell::RefCell;
use core::time::Duration;

use embassy_sync::blocking_mutex::Mutex;
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use heapless::Vec;
use log::{debug, info};

use crate::app::ports::{Direction, Edge, GpioError, GpioPort, IrqHandle};

/// Highest GPIO number on the ESP32-S3.
const MAX_GPIO: i32 = 48;
/// Claimable lines per device instance (outputs + button, with slack).
const MAX_LINES: usize = 8;

#[derive(Debug, Clone, Copy)]
struct LineEntry {
    gpio: i32,
    level: bool,
    published: bool,
}

/// Concrete [`GpioPort`] over the ESP-IDF GPIO layer.
pub struct EspGpio {
    lines: Mutex<CriticalSectionRawMutex, RefCell<Vec<LineEntry, MAX_LINES>>>,
}

impl EspGpio {
    pub fn new() -> Self {
        Self {
            lines: Mutex::new(RefCell::new(Vec::new())),
        }
    }

    fn with_entry<R>(&self, gpio: i32, f: impl FnOnce(Option<&mut LineEntry>) -> R) -> R {
        self.lines.lock(|cell| {
            let mut lines = cell.borrow_mut();
            f(lines.iter_mut().find(|e| e.gpio == gpio))
        })
    }

    fn is_claimed(&self, gpio: i32) -> bool {
        self.lines
            .lock(|cell| cell.borrow().iter().any(|e| e.gpio == gpio))
    }
}

impl GpioPort for EspGpio {
    fn line_is_valid(&self, gpio: i32) -> bool {
        // Flash/PSRAM pins are never usable as panel lines.
        (0..=MAX_GPIO).contains(&gpio) && !(26..=32).contains(&gpio)
    }

    fn claim(&self, gpio: i32) -> Result<(), GpioError> {
        self.lines.lock(|cell| {
            let mut lines = cell.borrow_mut();
            if lines.iter().any(|e| e.gpio == gpio) {
                return Err(GpioError::Busy);
            }
            lines
                .push(LineEntry {
                    gpio,
                    level: false,
                    published: false,
                })
                .map_err(|_| GpioError::Unsupported)
        })?;
        debug!("claimed GPIO {}", gpio);
        Ok(())
    }

    fn release(&self, gpio: i32) {
        let removed = self.lines.lock(|cell| {
            let mut lines = cell.borrow_mut();
            match lines.iter().position(|e| e.gpio == gpio) {
                Some(pos) => {
                    let _ = lines.swap_remove(pos);
                    true
                }
                None => false,
            }
        });
        if removed {
            hw::reset_pin(gpio);
            debug!("released GPIO {}", gpio);
        }
    }

    fn set_direction(&self, gpio: i32, dir: Direction) -> Result<(), GpioError> {
        if !self.is_claimed(gpio) {
            return Err(GpioError::NotClaimed);
        }
        hw::configure(gpio, dir)
    }

    fn set_value(&self, gpio: i32, high: bool) {
        self.with_entry(gpio, |entry| {
            if let Some(e) = entry {
                e.level = high;
                hw::write_level(gpio, high);
            }
        });
    }

    fn get_value(&self, gpio: i32) -> bool {
        let cached = self.with_entry(gpio, |entry| entry.map(|e| e.level));
        match cached {
            Some(level) => hw::read_level(gpio).unwrap_or(level),
            None => false,
        }
    }

    fn set_debounce(&self, gpio: i32, window: Duration) -> Result<(), GpioError> {
        if !self.is_claimed(gpio) {
            return Err(GpioError::NotClaimed);
        }
        // No hardware debounce on this SoC; the watcher enforces the
        // window in software.
        info!(
            "GPIO {}: debounce window {}ms (software-enforced)",
            gpio,
            window.as_millis()
        );
        Ok(())
    }

    fn publish(&self, gpio: i32) -> Result<(), GpioError> {
        self.with_entry(gpio, |entry| match entry {
            Some(e) => {
                e.published = true;
                Ok(())
            }
            None => Err(GpioError::NotClaimed),
        })?;
        info!("GPIO {} published", gpio);
        Ok(())
    }

    fn unpublish(&self, gpio: i32) {
        let was_published = self.with_entry(gpio, |entry| match entry {
            Some(e) => {
                e.published = false;
                true
            }
            None => false,
        });
        if was_published {
            info!("GPIO {} unpublished", gpio);
        }
    }

    fn register_edge_irq(&self, gpio: i32, edge: Edge) -> Result<IrqHandle, GpioError> {
        // ISR-service installation allocates and must not run with
        // interrupts held off; check the claim, then attach unlocked.
        if !self.is_claimed(gpio) {
            return Err(GpioError::NotClaimed);
        }
        hw::attach_edge_isr(gpio, edge)?;
        info!("GPIO {}: edge interrupt registered ({:?})", gpio, edge);
        Ok(IrqHandle(gpio as u32))
    }

    fn unregister_edge_irq(&self, handle: IrqHandle) {
        hw::detach_edge_isr(handle.0 as i32);
        info!("GPIO {}: edge interrupt unregistered", handle.0);
    }
}

// ── Hardware half ─────────────────────────────────────────────

#[cfg(target_os = "espidf")]
mod hw {
    use esp_idf_svc::sys::*;

    use crate::app::ports::{Direction, Edge, GpioError};
    use crate::drivers::edge::edge_isr_handler;

    pub fn configure(gpio: i32, dir: Direction) -> Result<(), GpioError> {
        let cfg = gpio_config_t {
            pin_bit_mask: 1u64 << gpio,
            mode: match dir {
                Direction::Input => gpio_mode_t_GPIO_MODE_INPUT,
                Direction::Output => gpio_mode_t_GPIO_MODE_OUTPUT,
            },
            pull_up_en: match dir {
                // Button is active-low with a pull-up.
                Direction::Input => gpio_pullup_t_GPIO_PULLUP_ENABLE,
                Direction::Output => gpio_pullup_t_GPIO_PULLUP_DISABLE,
            },
            pull_down_en: gpio_pulldown_t_GPIO_PULLDOWN_DISABLE,
            intr_type: gpio_int_type_t_GPIO_INTR_DISABLE,
        };
        // SAFETY: plain register configuration of a claimed pin.
        let ret = unsafe { gpio_config(&cfg) };
        if ret == ESP_OK {
            Ok(())
        } else {
            Err(GpioError::Host(ret))
        }
    }

    pub fn write_level(gpio: i32, high: bool) {
        // SAFETY: gpio_set_level writes to an already-configured output.
        unsafe {
            gpio_set_level(gpio, u32::from(high));
        }
    }

    pub fn read_level(gpio: i32) -> Option<bool> {
        // SAFETY: gpio_get_level is a read-only register access.
        Some(unsafe { gpio_get_level(gpio) } != 0)
    }

    pub fn reset_pin(gpio: i32) {
        // SAFETY: returns the pin to its power-on state after release.
        unsafe {
            gpio_reset_pin(gpio);
        }
    }

    unsafe extern "C" fn panel_edge_isr(_arg: *mut core::ffi::c_void) {
        // SAFETY: esp_timer_get_time is an RTC counter read; ISR-safe.
        let now_ms = (unsafe { esp_timer_get_time() } / 1_000) as u32;
        edge_isr_handler(now_ms);
    }

    pub fn attach_edge_isr(gpio: i32, edge: Edge) -> Result<(), GpioError> {
        // SAFETY: gpio_install_isr_service is idempotent;
        // ESP_ERR_INVALID_STATE means it was already installed. The
        // handler only performs a lock-free atomic store.
        unsafe {
            let ret = gpio_install_isr_service(0);
            if ret != ESP_OK && ret != ESP_ERR_INVALID_STATE {
                return Err(GpioError::Host(ret));
            }
            gpio_set_intr_type(
                gpio,
                match edge {
                    Edge::Rising => gpio_int_type_t_GPIO_INTR_POSEDGE,
                    Edge::Falling => gpio_int_type_t_GPIO_INTR_NEGEDGE,
                },
            );
            let ret = gpio_isr_handler_add(gpio, Some(panel_edge_isr), core::ptr::null_mut());
            if ret != ESP_OK {
                return Err(GpioError::Host(ret));
            }
            gpio_intr_enable(gpio);
        }
        Ok(())
    }

    pub fn detach_edge_isr(gpio: i32) {
        // SAFETY: symmetric teardown of attach_edge_isr.
        unsafe {
            gpio_intr_disable(gpio);
            gpio_isr_handler_remove(gpio);
        }
    }
}

#[cfg(not(target_os = "espidf"))]
mod hw {
    use crate::app::ports::{Direction, Edge, GpioError};

    pub fn configure(_gpio: i32, _dir: Direction) -> Result<(), GpioError> {
        Ok(())
    }

    pub fn write_level(_gpio: i32, _high: bool) {}

    /// `None` defers to the adapter's cached level on the host.
    pub fn read_level(_gpio: i32) -> Option<bool> {
        None
    }

    pub fn reset_pin(_gpio: i32) {}

    pub fn attach_edge_isr(_gpio: i32, _edge: Edge) -> Result<(), GpioError> {
        Ok(())
    }

    pub fn detach_edge_isr(_gpio: i32) {}
}
