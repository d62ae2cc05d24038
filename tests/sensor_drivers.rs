use i2c_sensor_drivers::bus::mock::{MockBus, Transfer};
use i2c_sensor_drivers::device::DeviceHandle;
use i2c_sensor_drivers::errors::{SensorError, TransferOp};
use i2c_sensor_drivers::sensors::tmp007::{self, Tmp007};
use i2c_sensor_drivers::sensors::vl6180::{self, Vl6180};
use i2c_sensor_drivers::{Reading, SensorDriver};

#[test]
fn tmp007_setup_then_repeated_reads() {
    let bus = MockBus::new();
    bus.set_register(0x03, &[0x01, 0x00]);
    let handle = DeviceHandle::with_transfer("/dev/i2c-1", tmp007::DEFAULT_ADDRESS, bus.clone());
    let mut sensor = Tmp007::configure(handle).unwrap();

    for _ in 0..3 {
        let f = sensor.read_temperature().unwrap();
        assert!((f - 35.6).abs() < 1e-5);
    }

    // One configuration write, then select + read per sample
    let transfers = bus.transfers();
    assert_eq!(transfers.len(), 1 + 3 * 2);
    assert_eq!(transfers[0], Transfer::Write(vec![0x02, 0x15, 0x40]));
    sensor.close();
}

#[test]
fn tmp007_configuration_failure_is_all_or_nothing() {
    let bus = MockBus::new();
    bus.limit_write(2);
    let handle = DeviceHandle::with_transfer("/dev/i2c-1", tmp007::DEFAULT_ADDRESS, bus.clone());

    match Tmp007::configure(handle) {
        Err(SensorError::TransportError { op, expected, transferred, .. }) => {
            assert_eq!(op, TransferOp::Write);
            assert_eq!(expected, 3);
            assert_eq!(transferred, 2);
        }
        Err(other) => panic!("unexpected error: {}", other),
        Ok(_) => panic!("configuration should have failed"),
    }
}

#[test]
fn tmp007_read_error_is_out_of_band() {
    let bus = MockBus::new();
    let handle = DeviceHandle::with_transfer("/dev/i2c-1", tmp007::DEFAULT_ADDRESS, bus.clone());
    let mut sensor = Tmp007::configure(handle).unwrap();
    bus.fail_reads();

    // A failed read never looks like a temperature
    let result = SensorDriver::read(&mut sensor);
    assert!(matches!(result, Err(ref e) if e.is_transport()));
}

#[test]
fn vl6180_setup_then_read_range() {
    let bus = MockBus::with_word_index();
    let handle = DeviceHandle::with_transfer("/dev/i2c-1", vl6180::DEFAULT_ADDRESS, bus.clone());
    let mut sensor = Vl6180::configure(handle).unwrap();

    assert_eq!(bus.register(0x0016), Some(vec![0x00]));
    assert_eq!(bus.register(0x0015), Some(vec![0x07]));
    assert_eq!(bus.register(0x0018), Some(vec![0x03]));

    bus.set_register(0x0063, &[255]);
    assert_eq!(
        SensorDriver::read(&mut sensor).unwrap(),
        Reading::Range { millimeters: 255 }
    );
}

#[test]
fn vl6180_configuration_failure_is_all_or_nothing() {
    let bus = MockBus::with_word_index();
    bus.fail_write_at(0);
    let handle = DeviceHandle::with_transfer("/dev/i2c-1", vl6180::DEFAULT_ADDRESS, bus.clone());

    assert!(Vl6180::configure(handle).is_err());
    assert_eq!(bus.transfers().len(), 1);
}

#[test]
fn setup_on_missing_bus_yields_no_handle() {
    assert!(matches!(
        Tmp007::setup("/dev/i2c-does-not-exist"),
        Err(SensorError::OpenError { .. })
    ));
    assert!(matches!(
        Vl6180::setup("/dev/i2c-does-not-exist"),
        Err(SensorError::OpenError { .. })
    ));
}
