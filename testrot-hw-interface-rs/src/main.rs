//! testrot-hw-interface
//!
//! Rotary encoder position counter for the Raspberry Pi Pico 2 with an
//! SSD1306 OLED on a switchable supply rail.
//!
//! 1. The encoder shaft turns; channel A or B changes level.
//! 2. The GPIO interrupt wakes the encoder task, which samples both
//!    channels and feeds the static `QuadratureDecoder` (atomic update, no
//!    logging, no I2C).
//! 3. The OLED task polls the decoder once per executor iteration and, when
//!    the position moved, logs it and redraws the label and value.

#![no_std]
#![no_main]

use defmt::*;
use embassy_executor::Spawner;
use embassy_rp::bind_interrupts;
use embassy_rp::block::ImageDef;
use embassy_rp::gpio::{Input, Level, Output, Pull};
use embassy_rp::i2c::{self, I2c};
use embassy_rp::peripherals::I2C0;
use embassy_time::{Delay, Timer};
use {defmt_rtt as _, panic_probe as _};

use quadrature_decoder::{watch, QuadratureDecoder, QuadraturePins};
use testrot_oled_display_rs::{
    counter_update_task, render_counter, CounterConfig, CounterRenderer, DisplayPower, OledDriver,
    PowerSequence,
};

// ---------------------------------------------------------------------------
// Boot block and interrupt binding
// ---------------------------------------------------------------------------

/// Tell the RP2350 Boot ROM about our application.
#[link_section = ".start_block"]
#[used]
pub static IMAGE_DEF: ImageDef = embassy_rp::block::ImageDef::secure_exe();

// Wire the I2C0 peripheral interrupt to Embassy's async handler.
bind_interrupts!(struct Irqs {
    I2C0_IRQ => i2c::InterruptHandler<I2C0>;
});

// ---------------------------------------------------------------------------
// Static storage
// ---------------------------------------------------------------------------

/// Encoder state: written by the encoder task, read by the OLED task.
static DECODER: QuadratureDecoder = QuadratureDecoder::new();

/// 7-bit I2C address of the SSD1306.
const OLED_ADDRESS: u8 = 0x3C;

/// Delay before the first log line so a freshly attached probe sees it.
const STARTUP_DELAY_MS: u64 = 500;

// ---------------------------------------------------------------------------
// Type aliases
// ---------------------------------------------------------------------------

/// Concrete I2C type for the OLED display (sole user of I2C0).
type OledI2c = I2c<'static, I2C0, i2c::Async>;

// ---------------------------------------------------------------------------
// Tasks
// ---------------------------------------------------------------------------

/// Edge handler for both encoder channels.
#[embassy_executor::task]
async fn encoder_task(pin_a: Input<'static>, pin_b: Input<'static>) {
    watch(QuadraturePins::new(pin_a, pin_b), &DECODER).await;
}

/// Thin wrapper that monomorphises the generic `counter_update_task` so it
/// can be spawned as a concrete Embassy task.
#[embassy_executor::task]
async fn oled_task(driver: OledDriver<OledI2c>, config: CounterConfig) {
    counter_update_task(driver, &DECODER, CounterRenderer::new(0), config).await;
}

// ---------------------------------------------------------------------------
// Main
// ---------------------------------------------------------------------------

#[embassy_executor::main]
async fn main(spawner: Spawner) {
    let p = embassy_rp::init(Default::default());

    Timer::after_millis(STARTUP_DELAY_MS).await;
    info!("Starting Encoder Test...");

    // —— Pin assignments ————————————————————————————————————————————————————
    // ENC_A   → GP14  (p.PIN_14)  CLK, pull-up, MSB
    // ENC_B   → GP15  (p.PIN_15)  DT, pull-up, LSB
    // VEXT    → GP18  (p.PIN_18)  OLED rail enable, active-low
    // OLED_RST→ GP19  (p.PIN_19)  active-low reset
    // I2C_SDA → GP20  (p.PIN_20)
    // I2C_SCL → GP21  (p.PIN_21)
    // ———————————————————————————————————————————————————————————————————————

    let config = CounterConfig::default();
    let mut delay = Delay;

    // —— Display bring-up ———————————————————————————————————————————————————

    // Rail starts off (HIGH on an active-low enable); reset released.
    let mut power = DisplayPower::new(
        Output::new(p.PIN_18, Level::High),
        Output::new(p.PIN_19, Level::High),
        PowerSequence::default(),
    );

    info!("Powering on display...");
    if let Err(e) = power.enable_rail(&mut delay).await {
        error!("Display power enable failed: {}", e);
        return;
    }

    info!("Resetting display...");
    if let Err(e) = power.pulse_reset(&mut delay).await {
        error!("Display reset failed: {}", e);
        return;
    }

    info!("Initializing display...");
    let mut i2c_config = i2c::Config::default();
    i2c_config.frequency = 400_000;
    let i2c = I2c::new_async(
        p.I2C0,
        p.PIN_21, // SCL
        p.PIN_20, // SDA
        Irqs,
        i2c_config,
    );

    let mut oled = OledDriver::new(i2c, OLED_ADDRESS, config.rotation(), config.contrast);
    if let Err(e) = oled.init().await {
        error!("OLED init failed: {}", e);
        return;
    }
    oled.clear_buffer();
    if let Err(e) = oled.flush().await {
        warn!("Initial clear failed: {}", e);
    }

    info!("Drawing boot text...");
    if let Some(display) = oled.display_mut() {
        if render_counter(display, 0, &config).is_err() {
            warn!("Boot text render failed");
        }
    }
    if let Err(e) = oled.flush().await {
        warn!("Boot text flush failed: {}", e);
    }

    // —— Encoder ————————————————————————————————————————————————————————————

    info!("Setting up encoder pins...");
    let pin_a = Input::new(p.PIN_14, Pull::Up);
    let pin_b = Input::new(p.PIN_15, Pull::Up);

    // `watch` seeds the decoder from the current levels before arming
    // edge detection on either channel.
    spawner.spawn(encoder_task(pin_a, pin_b)).unwrap();
    spawner.spawn(oled_task(oled, config)).unwrap();

    info!("Ready! Rotate the encoder.");
}
