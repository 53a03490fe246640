//! Integration tests: lifecycle rollback, control-channel scenarios, and
//! the edge path, driven through mock ports.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use ledpanel::app::commands::{Command, LineId};
use ledpanel::app::events::AppEvent;
use ledpanel::app::ports::{Direction, Edge, EventSink, GpioError, GpioPort, IrqHandle};
use ledpanel::config::{ButtonConfig, OutputLineConfig, PanelConfig};
use ledpanel::lifecycle::Device;

// ── Mock implementations ──────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
enum Call {
    Claim(i32),
    Release(i32),
    SetDirection(i32, Direction),
    SetValue(i32, bool),
    SetDebounce(i32, u64),
    Publish(i32),
    Unpublish(i32),
    RegisterIrq(i32),
    UnregisterIrq(u32),
}

#[derive(Default)]
struct GpioState {
    calls: Vec<Call>,
    claimed: Vec<i32>,
    levels: HashMap<i32, bool>,
    invalid: Vec<i32>,
    fail_claim_on: Option<i32>,
    fail_publish_on: Option<i32>,
    fail_irq: bool,
}

/// Shared-handle mock so the test can inspect state after the device
/// consumed its copy.
#[derive(Clone, Default)]
struct MockGpio(Rc<RefCell<GpioState>>);

impl MockGpio {
    fn new() -> Self {
        Self::default()
    }

    fn calls(&self) -> Vec<Call> {
        self.0.borrow().calls.clone()
    }

    fn claimed(&self) -> Vec<i32> {
        self.0.borrow().claimed.clone()
    }

    fn level(&self, gpio: i32) -> Option<bool> {
        self.0.borrow().levels.get(&gpio).copied()
    }
}

impl GpioPort for MockGpio {
    fn line_is_valid(&self, gpio: i32) -> bool {
        !self.0.borrow().invalid.contains(&gpio)
    }

    fn claim(&self, gpio: i32) -> Result<(), GpioError> {
        let mut s = self.0.borrow_mut();
        s.calls.push(Call::Claim(gpio));
        if s.fail_claim_on == Some(gpio) {
            return Err(GpioError::Busy);
        }
        s.claimed.push(gpio);
        Ok(())
    }

    fn release(&self, gpio: i32) {
        let mut s = self.0.borrow_mut();
        s.calls.push(Call::Release(gpio));
        s.claimed.retain(|&g| g != gpio);
    }

    fn set_direction(&self, gpio: i32, dir: Direction) -> Result<(), GpioError> {
        self.0.borrow_mut().calls.push(Call::SetDirection(gpio, dir));
        Ok(())
    }

    fn set_value(&self, gpio: i32, high: bool) {
        let mut s = self.0.borrow_mut();
        s.calls.push(Call::SetValue(gpio, high));
        s.levels.insert(gpio, high);
    }

    fn get_value(&self, gpio: i32) -> bool {
        self.0.borrow().levels.get(&gpio).copied().unwrap_or(false)
    }

    fn set_debounce(&self, gpio: i32, window: core::time::Duration) -> Result<(), GpioError> {
        self.0
            .borrow_mut()
            .calls
            .push(Call::SetDebounce(gpio, window.as_millis() as u64));
        Ok(())
    }

    fn publish(&self, gpio: i32) -> Result<(), GpioError> {
        let mut s = self.0.borrow_mut();
        s.calls.push(Call::Publish(gpio));
        if s.fail_publish_on == Some(gpio) {
            return Err(GpioError::Host(-1));
        }
        Ok(())
    }

    fn unpublish(&self, gpio: i32) {
        self.0.borrow_mut().calls.push(Call::Unpublish(gpio));
    }

    fn register_edge_irq(&self, gpio: i32, _edge: Edge) -> Result<IrqHandle, GpioError> {
        let mut s = self.0.borrow_mut();
        s.calls.push(Call::RegisterIrq(gpio));
        if s.fail_irq {
            return Err(GpioError::Unsupported);
        }
        Ok(IrqHandle(gpio as u32))
    }

    fn unregister_edge_irq(&self, handle: IrqHandle) {
        self.0.borrow_mut().calls.push(Call::UnregisterIrq(handle.0));
    }
}

#[derive(Clone, Default)]
struct RecordingSink(Rc<RefCell<Vec<AppEvent>>>);

impl RecordingSink {
    fn new() -> Self {
        Self::default()
    }

    fn events(&self) -> Vec<AppEvent> {
        self.0.borrow().clone()
    }
}

impl EventSink for RecordingSink {
    fn emit(&self, event: &AppEvent) {
        self.0.borrow_mut().push(*event);
    }
}

// ── Configs under test ────────────────────────────────────────
//
// Mirror the board constructors but with test-local GPIO numbers so
// the assertions stay readable.

const LED: i32 = 40;
const BTN: i32 = 41;
const RED: i32 = 10;
const YELLOW: i32 = 11;
const GREEN: i32 = 12;

fn single_led_config() -> PanelConfig {
    let mut c = PanelConfig::single_led();
    c.outputs[0].gpio = LED;
    c.button = Some(ButtonConfig {
        gpio: BTN,
        toggle_line: LineId::SINGLE,
        debounce_ms: 200,
    });
    c
}

fn traffic_light_config() -> PanelConfig {
    let mut c = PanelConfig::traffic_light();
    for (o, gpio) in c.outputs.iter_mut().zip([RED, YELLOW, GREEN]) {
        o.gpio = gpio;
    }
    c
}

fn acquire(
    config: PanelConfig,
) -> (Device<MockGpio, RecordingSink>, MockGpio, RecordingSink) {
    let gpio = MockGpio::new();
    let sink = RecordingSink::new();
    let device = Device::acquire(config, gpio.clone(), sink.clone()).expect("acquire");
    (device, gpio, sink)
}

// ── Acquisition ───────────────────────────────────────────────

#[test]
fn single_led_acquisition_order() {
    let (_device, gpio, sink) = acquire(single_led_config());

    let calls = gpio.calls();
    assert_eq!(
        calls,
        vec![
            Call::Claim(LED),
            Call::SetDirection(LED, Direction::Output),
            Call::SetValue(LED, true),
            Call::Publish(LED),
            Call::Claim(BTN),
            Call::SetDirection(BTN, Direction::Input),
            Call::SetDebounce(BTN, 200),
            Call::Publish(BTN),
            Call::RegisterIrq(BTN),
        ]
    );
    assert_eq!(sink.events(), vec![AppEvent::Started { lines: 1 }]);
}

#[test]
fn invalid_line_claims_nothing() {
    let gpio = MockGpio::new();
    gpio.0.borrow_mut().invalid.push(LED);
    let err = Device::acquire(single_led_config(), gpio.clone(), RecordingSink::new())
        .err()
        .expect("must fail");
    assert!(matches!(
        err,
        ledpanel::error::AcquireError::InvalidLine(g) if g == LED
    ));
    assert!(gpio.calls().is_empty(), "validation precedes any claim");
}

#[test]
fn output_failure_rolls_back_claimed_prefix() {
    let gpio = MockGpio::new();
    gpio.0.borrow_mut().fail_claim_on = Some(YELLOW);
    let sink = RecordingSink::new();
    let err = Device::acquire(traffic_light_config(), gpio.clone(), sink.clone())
        .err()
        .expect("must fail");

    assert!(matches!(
        err,
        ledpanel::error::AcquireError::OutputSetup { gpio: g, .. } if g == YELLOW
    ));
    // Exactly the prefix (red) was released again; green never claimed.
    assert!(gpio.claimed().is_empty());
    assert!(!gpio.calls().contains(&Call::Claim(GREEN)));
    assert!(gpio.calls().contains(&Call::Release(RED)));
    // Rollback drives the released output low.
    assert_eq!(gpio.level(RED), Some(false));
    // Control surface never became visible.
    assert!(sink.events().is_empty());
}

#[test]
fn publish_failure_releases_own_claim_too() {
    let gpio = MockGpio::new();
    gpio.0.borrow_mut().fail_publish_on = Some(YELLOW);
    let err = Device::acquire(traffic_light_config(), gpio.clone(), RecordingSink::new())
        .err()
        .expect("must fail");
    assert!(matches!(
        err,
        ledpanel::error::AcquireError::OutputSetup { gpio: g, .. } if g == YELLOW
    ));
    assert!(gpio.claimed().is_empty(), "half-configured line released");
}

#[test]
fn irq_failure_rolls_back_input_and_outputs() {
    let gpio = MockGpio::new();
    gpio.0.borrow_mut().fail_irq = true;
    let err = Device::acquire(single_led_config(), gpio.clone(), RecordingSink::new())
        .err()
        .expect("must fail");
    assert!(matches!(
        err,
        ledpanel::error::AcquireError::InterruptRegistrationFailed(_)
    ));
    assert!(gpio.claimed().is_empty());
    // Input released before outputs (reverse acquisition order).
    let calls = gpio.calls();
    let btn_release = calls.iter().position(|c| *c == Call::Release(BTN)).unwrap();
    let led_release = calls.iter().position(|c| *c == Call::Release(LED)).unwrap();
    assert!(btn_release < led_release);
}

// ── Control-channel scenarios ─────────────────────────────────

#[test]
fn single_output_write_scenario() {
    let (device, gpio, _sink) = acquire(single_led_config());

    // Boots on.
    assert_eq!(device.line_value(LineId::SINGLE), Some(true));
    assert_eq!(gpio.level(LED), Some(true));

    assert_eq!(device.channel_write(b"0"), 1);
    assert_eq!(device.line_value(LineId::SINGLE), Some(false));
    assert_eq!(gpio.level(LED), Some(false));

    assert_eq!(device.channel_write(b"1\n"), 2);
    assert_eq!(device.line_value(LineId::SINGLE), Some(true));
    assert_eq!(gpio.level(LED), Some(true));

    assert_eq!(device.counters().requests, 2);
}

#[test]
fn addressed_write_scenario() {
    let (device, gpio, sink) = acquire(traffic_light_config());

    // Line 1 off while already off: recognized, no visible change.
    assert_eq!(device.channel_write(b"10"), 2);
    assert_eq!(device.line_value(LineId(1)), Some(false));

    assert_eq!(device.channel_write(b"11"), 2);
    assert_eq!(device.line_value(LineId(1)), Some(true));
    assert_eq!(gpio.level(YELLOW), Some(true));

    assert_eq!(device.channel_write(b"21"), 2);
    assert_eq!(device.line_value(LineId(2)), Some(true));
    assert_eq!(gpio.level(GREEN), Some(true));

    // Out-of-range line digit: decodes, rejected by the controller,
    // nothing changes.
    assert_eq!(device.channel_write(b"30"), 2);
    assert!(sink
        .events()
        .contains(&AppEvent::CommandRejected { line: LineId(3) }));

    // Junk value byte: malformed outright, dropped after logging.
    assert_eq!(device.channel_write(b"3X"), 2);

    let snapshot: Vec<_> = [LineId(0), LineId(1), LineId(2)]
        .iter()
        .map(|&l| device.line_value(l).unwrap())
        .collect();
    assert_eq!(snapshot, vec![false, true, true], "no output changed");

    // b"30" decoded (counted); b"3X" did not.
    assert_eq!(device.counters().requests, 4);
}

#[test]
fn malformed_writes_still_report_bytes_consumed() {
    let (device, _gpio, _sink) = acquire(single_led_config());
    for junk in [&b"x"[..], b"", b"999", b"\n", b"on"] {
        assert_eq!(device.channel_write(junk), junk.len());
    }
    assert_eq!(device.counters().requests, 0);
    assert_eq!(device.line_value(LineId::SINGLE), Some(true));
}

// ── Edge path ─────────────────────────────────────────────────

#[test]
fn qualifying_edge_toggles_and_counts() {
    let (device, gpio, _sink) = acquire(single_led_config());
    assert_eq!(device.line_value(LineId::SINGLE), Some(true));

    assert!(device.handle_edge(1_000));
    assert_eq!(device.line_value(LineId::SINGLE), Some(false));
    assert_eq!(gpio.level(LED), Some(false));
    assert_eq!(device.counters().presses, 1);

    // Second edge inside the 200ms window: suppressed.
    assert!(!device.handle_edge(1_150));
    assert_eq!(device.counters().presses, 1);
    assert_eq!(device.line_value(LineId::SINGLE), Some(false));

    // Window elapsed: next press toggles back.
    assert!(device.handle_edge(1_300));
    assert_eq!(device.line_value(LineId::SINGLE), Some(true));
    assert_eq!(device.counters().presses, 2);
}

#[test]
fn buttonless_board_ignores_edges() {
    let (device, _gpio, _sink) = acquire(traffic_light_config());
    assert!(!device.handle_edge(1_000));
    assert_eq!(device.counters().presses, 0);
}

// ── Teardown ──────────────────────────────────────────────────

#[test]
fn shutdown_releases_everything_in_reverse() {
    let (device, gpio, sink) = acquire(single_led_config());
    device.channel_write(b"1");
    device.handle_edge(1_000);

    device.shutdown();

    assert!(gpio.claimed().is_empty());
    assert_eq!(gpio.level(LED), Some(false), "LED driven low at exit");

    let calls = gpio.calls();
    let unreg = calls.iter().position(|c| *c == Call::UnregisterIrq(BTN as u32)).unwrap();
    let btn_release = calls.iter().position(|c| *c == Call::Release(BTN)).unwrap();
    let led_release = calls.iter().position(|c| *c == Call::Release(LED)).unwrap();
    assert!(unreg < btn_release && btn_release < led_release);

    // Final counters surfaced through the sink.
    let last = *sink.events().last().unwrap();
    match last {
        AppEvent::Shutdown(snap) => {
            assert_eq!(snap.presses, 1);
            assert_eq!(snap.requests, 1);
        }
        other => panic!("expected Shutdown, got {other:?}"),
    }
}

#[test]
fn farewell_sweep_then_shutdown_leaves_panel_dark() {
    use ledpanel::drivers::patterns::boot_sweep;

    let (device, gpio, _sink) = acquire(traffic_light_config());
    device.channel_write(b"11");
    device.channel_write(b"21");

    // The buttonless board replays the sweep right before teardown;
    // every step must apply cleanly against whatever state the channel
    // left behind, and the pattern itself ends dark.
    for step in boot_sweep(&device.config().line_ids()) {
        device
            .apply(Command::Set { line: step.line, value: step.value })
            .expect("sweep only addresses configured lines");
    }
    for gpio_num in [RED, YELLOW, GREEN] {
        assert_eq!(gpio.level(gpio_num), Some(false), "sweep ends dark");
    }

    device.shutdown();
    assert!(gpio.claimed().is_empty());
    for gpio_num in [RED, YELLOW, GREEN] {
        assert_eq!(gpio.level(gpio_num), Some(false));
    }
}

#[test]
fn counters_start_at_zero_on_fresh_acquisition() {
    let (device, _gpio, _sink) = acquire(single_led_config());
    device.handle_edge(1_000);
    device.channel_write(b"0");
    device.shutdown();

    let (device, _gpio, _sink) = acquire(single_led_config());
    assert_eq!(device.counters().presses, 0);
    assert_eq!(device.counters().requests, 0);
}

// ── Concurrency ───────────────────────────────────────────────

mod concurrent {
    use super::*;
    use std::sync::Mutex;

    /// Sync mock for cross-thread apply: only levels matter here.
    #[derive(Default)]
    struct SyncGpio {
        levels: Mutex<HashMap<i32, bool>>,
    }

    impl GpioPort for SyncGpio {
        fn line_is_valid(&self, _gpio: i32) -> bool {
            true
        }
        fn claim(&self, _gpio: i32) -> Result<(), GpioError> {
            Ok(())
        }
        fn release(&self, _gpio: i32) {}
        fn set_direction(&self, _gpio: i32, _dir: Direction) -> Result<(), GpioError> {
            Ok(())
        }
        fn set_value(&self, gpio: i32, high: bool) {
            self.levels.lock().unwrap().insert(gpio, high);
        }
        fn get_value(&self, gpio: i32) -> bool {
            self.levels.lock().unwrap().get(&gpio).copied().unwrap_or(false)
        }
        fn set_debounce(
            &self,
            _gpio: i32,
            _window: core::time::Duration,
        ) -> Result<(), GpioError> {
            Ok(())
        }
        fn publish(&self, _gpio: i32) -> Result<(), GpioError> {
            Ok(())
        }
        fn unpublish(&self, _gpio: i32) {}
        fn register_edge_irq(&self, _gpio: i32, _edge: Edge) -> Result<IrqHandle, GpioError> {
            Ok(IrqHandle(0))
        }
        fn unregister_edge_irq(&self, _handle: IrqHandle) {}
    }

    /// No toggle may be lost when two contexts hammer the same line:
    /// an even total count must restore the initial value.
    #[test]
    fn concurrent_toggles_are_never_lost() {
        use ledpanel::app::controller::OutputController;
        use std::sync::Arc;

        let ctl = Arc::new(OutputController::new(&[OutputLineConfig {
            id: LineId(0),
            gpio: 4,
            initial: false,
        }]));
        let gpio = Arc::new(SyncGpio::default());

        let mut handles = Vec::new();
        for _ in 0..2 {
            let ctl = Arc::clone(&ctl);
            let gpio = Arc::clone(&gpio);
            handles.push(std::thread::spawn(move || {
                for _ in 0..1_000 {
                    ctl.apply(&*gpio, Command::Toggle { line: LineId(0) }).unwrap();
                }
            }));
        }
        for h in handles {
            h.join().unwrap();
        }

        // 2000 toggles in total: state must be back where it started,
        // and the cached value must match the pin.
        assert_eq!(ctl.value(LineId(0)), Some(false));
        assert!(!gpio.get_value(4));
    }

    /// A toggle racing a set ends in a state explained by some serial
    /// order of the two.
    #[test]
    fn toggle_and_set_serialize() {
        use ledpanel::app::controller::OutputController;
        use std::sync::Arc;

        for _ in 0..100 {
            let ctl = Arc::new(OutputController::new(&[OutputLineConfig {
                id: LineId(0),
                gpio: 4,
                initial: false,
            }]));
            let gpio = Arc::new(SyncGpio::default());

            let t = {
                let (ctl, gpio) = (Arc::clone(&ctl), Arc::clone(&gpio));
                std::thread::spawn(move || {
                    ctl.apply(&*gpio, Command::Toggle { line: LineId(0) }).unwrap()
                })
            };
            let s = {
                let (ctl, gpio) = (Arc::clone(&ctl), Arc::clone(&gpio));
                std::thread::spawn(move || {
                    ctl.apply(&*gpio, Command::Set { line: LineId(0), value: true }).unwrap()
                })
            };
            t.join().unwrap();
            s.join().unwrap();

            // Serial orders: toggle;set -> true, set;toggle -> false.
            let v = ctl.value(LineId(0)).unwrap();
            assert_eq!(v, gpio.get_value(4), "cache and pin agree");
        }
    }
}
