#![no_std]
#![no_main]

use defmt::{error, info, warn};
use defmt_rtt as _;
use embassy_executor::Spawner;
use embassy_net::{Ipv4Address, Ipv4Cidr, Stack, StackResources, StaticConfigV4};
use embassy_rp::bind_interrupts;
use embassy_rp::clocks::RoscRng;
use embassy_rp::flash::Flash;
use embassy_rp::gpio::{Input, Level, Output, Pull};
use embassy_rp::peripherals::{DMA_CH0, PIO0, USB};
use embassy_rp::pio::Pio;
use embassy_rp::usb::Driver;
use embassy_sync::mutex::Mutex;
use embassy_time::Timer;
use embassy_usb::class::hid::State;
use embassy_usb::{Builder, Config as UsbConfig};
use cyw43_pio::{PioSpi, DEFAULT_CLOCK_DIVIDER};
use rand_core::RngCore;
use static_cell::StaticCell;

use pedal_firmware::indicator::{self, IndicatorSignal};
use pedal_firmware::{
    configure_usb_keyboard, dns, http, FlashStore, Footswitch, LoadOutcome, Pedal, PedalMutex,
    SignalIndicator, UsbKeyboard, AP_ADDRESS, WIFI_CHANNEL, WIFI_PASSWORD, WIFI_SSID,
};

#[cfg(feature = "dev-panic")]
use panic_probe as _;
#[cfg(feature = "prod-panic")]
use panic_reset as _;

bind_interrupts!(struct Irqs {
    PIO0_IRQ_0 => embassy_rp::pio::InterruptHandler<PIO0>;
    USBCTRL_IRQ => embassy_rp::usb::InterruptHandler<USB>;
});

/// How long the trigger is locked out after an emission, so switch
/// bounce on the way out cannot double-fire.
const TRIGGER_SETTLE_MS: u64 = 100;

/// Wi-Fi chip state.
static CYW43_STATE: StaticCell<cyw43::State> = StaticCell::new();

/// Network stack resources (sockets: HTTP, DNS, slack for probes).
static NET_RESOURCES: StaticCell<StackResources<8>> = StaticCell::new();

/// USB device configuration buffers.
static CONFIG_DESCRIPTOR: StaticCell<[u8; 256]> = StaticCell::new();
static BOS_DESCRIPTOR: StaticCell<[u8; 256]> = StaticCell::new();
static MSOS_DESCRIPTOR: StaticCell<[u8; 256]> = StaticCell::new();
static CONTROL_BUF: StaticCell<[u8; 64]> = StaticCell::new();

/// HID state.
static HID_STATE: StaticCell<State> = StaticCell::new();

/// The controller behind its single writer lock.
static PEDAL: StaticCell<PedalMutex> = StaticCell::new();

/// Activity events for the LED task.
static INDICATOR_SIGNAL: IndicatorSignal = IndicatorSignal::new();

#[embassy_executor::main]
async fn main(spawner: Spawner) {
    info!("Budget-G pedal starting...");

    let p = embassy_rp::init(embassy_rp::config::Config::default());

    // --- USB HID keyboard ---
    let usb_driver = Driver::new(p.USB, Irqs);

    let mut usb_config = UsbConfig::new(0x1209, 0x0001); // pid.codes test VID/PID
    usb_config.manufacturer = Some("Budget-G");
    usb_config.product = Some("Budget-G Pedal");
    usb_config.serial_number = Some("001");
    usb_config.max_power = 100;
    usb_config.max_packet_size_0 = 64;

    let config_descriptor = CONFIG_DESCRIPTOR.init([0; 256]);
    let bos_descriptor = BOS_DESCRIPTOR.init([0; 256]);
    let msos_descriptor = MSOS_DESCRIPTOR.init([0; 256]);
    let control_buf = CONTROL_BUF.init([0; 64]);

    let mut builder = Builder::new(
        usb_driver,
        usb_config,
        config_descriptor,
        bos_descriptor,
        msos_descriptor,
        control_buf,
    );

    let hid_state = HID_STATE.init(State::new());
    let hid_writer = configure_usb_keyboard(&mut builder, hid_state);
    let usb_device = builder.build();
    spawner.spawn(usb_task(usb_device)).unwrap();

    let keyboard = UsbKeyboard::new(hid_writer);

    // --- Wi-Fi chip ---
    // Firmware blobs for the CYW43439; see README for where to get them.
    let fw = include_bytes!("../../cyw43-firmware/43439A0.bin");
    let clm = include_bytes!("../../cyw43-firmware/43439A0_clm.bin");

    let pwr = Output::new(p.PIN_23, Level::Low);
    let cs = Output::new(p.PIN_25, Level::High);
    let mut pio = Pio::new(p.PIO0, Irqs);
    let spi = PioSpi::new(
        &mut pio.common,
        pio.sm0,
        DEFAULT_CLOCK_DIVIDER,
        pio.irq0,
        cs,
        p.PIN_24,
        p.PIN_29,
        p.DMA_CH0,
    );

    let cyw43_state = CYW43_STATE.init(cyw43::State::new());
    let (net_device, mut control, runner) = cyw43::new(cyw43_state, pwr, spi, fw).await;
    spawner.spawn(cyw43_task(runner)).unwrap();

    control.init(clm).await;
    control
        .set_power_management(cyw43::PowerManagementMode::PowerSave)
        .await;

    // --- Network stack: fixed address, no gateway, we are the network ---
    let address = Ipv4Address::new(AP_ADDRESS[0], AP_ADDRESS[1], AP_ADDRESS[2], AP_ADDRESS[3]);
    let net_config = embassy_net::Config::ipv4_static(StaticConfigV4 {
        address: Ipv4Cidr::new(address, 24),
        gateway: None,
        dns_servers: heapless::Vec::new(),
    });

    let mut rng = RoscRng;
    let seed = rng.next_u64();

    let resources = NET_RESOURCES.init(StackResources::new());
    let (stack, net_runner) = embassy_net::new(net_device, net_config, resources, seed);
    spawner.spawn(net_task(net_runner)).unwrap();

    control
        .start_ap_wpa2(WIFI_SSID, WIFI_PASSWORD, WIFI_CHANNEL)
        .await;
    info!("access point '{}' up at 192.168.4.1", WIFI_SSID);

    // --- Controller: load settings, then open for business ---
    let store = FlashStore::new(Flash::new_blocking(p.FLASH));
    let indicator = SignalIndicator::new(&INDICATOR_SIGNAL);
    let (pedal, load) = Pedal::start(store, keyboard, indicator).await;
    match load {
        LoadOutcome::Restored => info!("settings restored from flash"),
        LoadOutcome::NoRecord => info!("no saved settings in flash, using defaults"),
        LoadOutcome::CorruptRecord => warn!("saved settings unreadable, using defaults"),
        LoadOutcome::StorageUnavailable => warn!("flash unavailable, settings will not persist"),
    }
    let pedal: &'static PedalMutex = PEDAL.init(Mutex::new(pedal));

    let footswitch = Footswitch::new(Input::new(p.PIN_16, Pull::Up));

    spawner.spawn(indicator_task(control)).unwrap();
    spawner.spawn(dns_task(stack)).unwrap();
    spawner.spawn(http_task(stack, pedal)).unwrap();
    spawner.spawn(button_task(footswitch, pedal)).unwrap();

    info!("Budget-G pedal ready");
}

/// Wi-Fi chip driver task.
#[embassy_executor::task]
async fn cyw43_task(
    runner: cyw43::Runner<'static, Output<'static>, PioSpi<'static, PIO0, 0, DMA_CH0>>,
) -> ! {
    runner.run().await
}

/// Network stack task.
#[embassy_executor::task]
async fn net_task(mut runner: embassy_net::Runner<'static, cyw43::NetDriver<'static>>) -> ! {
    runner.run().await
}

/// USB device task - runs the USB stack.
#[embassy_executor::task]
async fn usb_task(mut device: embassy_usb::UsbDevice<'static, Driver<'static, USB>>) -> ! {
    device.run().await
}

/// Captive-portal DNS task.
#[embassy_executor::task]
async fn dns_task(stack: Stack<'static>) -> ! {
    dns::serve(stack, AP_ADDRESS).await
}

/// Configuration server task.
#[embassy_executor::task]
async fn http_task(stack: Stack<'static>, pedal: &'static PedalMutex) -> ! {
    http::serve(stack, pedal).await
}

/// LED task - renders activity signals as blinks.
#[embassy_executor::task]
async fn indicator_task(control: cyw43::Control<'static>) -> ! {
    indicator::run(control, &INDICATOR_SIGNAL).await
}

/// Footswitch task - one debounced press, one emission.
#[embassy_executor::task]
async fn button_task(mut footswitch: Footswitch<'static>, pedal: &'static PedalMutex) -> ! {
    loop {
        footswitch.wait_for_press().await;
        {
            let mut pedal = pedal.lock().await;
            if let Err(e) = pedal.on_trigger().await {
                error!("trigger emission failed: {:?}", e);
            }
        }
        // Post-action lockout, then wait out the release so a held switch
        // emits exactly once.
        Timer::after_millis(TRIGGER_SETTLE_MS).await;
        footswitch.wait_for_release().await;
    }
}
