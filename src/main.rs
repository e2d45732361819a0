//! RF Link Bridge Main Application
//!
//! Entry point for the STM32G474-based wireless serial link firmware.
//! Initializes hardware, runs the radio boot sequence and spawns the
//! cooperative tasks around the arbitration loop.

#![no_std]
#![no_main]

use embassy_executor::Spawner;
use embassy_stm32::gpio::{Level, Output, Speed};
use embassy_stm32::mode::{Async, Blocking};
use embassy_stm32::spi::{self, Spi};
use embassy_stm32::time::Hertz;
use embassy_stm32::usart::{self, RingBufferedUartRx, Uart, UartTx};
use embassy_stm32::wdg::IndependentWatchdog;
use embassy_stm32::{bind_interrupts, peripherals};
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::channel::Channel;
use embassy_time::{Delay, Ticker};
use static_cell::StaticCell;
use {defmt_rtt as _, panic_probe as _};

use rflink_firmware::drivers::cc1101::Cc1101;
use rflink_firmware::hal::gpio::StatusLed;
use rflink_firmware::prelude::*;
use rflink_firmware::radio::link::{initialize, LinkEngine};
use rflink_firmware::radio::timing::LinkTimers;

// Bind interrupt handlers
bind_interrupts!(struct Irqs {
    USART1 => usart::InterruptHandler<peripherals::USART1>;
});

/// The radio driver instantiated for this board
type Radio = Cc1101<Spi<'static, Blocking>, Output<'static>>;

/// Countdown timers shared between the tick task and the link task
static LINK_TIMERS: LinkTimers = LinkTimers::new();

/// Host bytes on their way from the UART ring to the serial bridge
static HOST_BYTES: Channel<CriticalSectionRawMutex, u8, SERIAL_QUEUE_LEN> = Channel::new();

/// Backing storage for the UART receive DMA ring
static UART_RX_BUF: StaticCell<[u8; 64]> = StaticCell::new();

/// Main entry point
#[embassy_executor::main]
async fn main(spawner: Spawner) {
    info!("RF link bridge firmware v{}", env!("CARGO_PKG_VERSION"));

    let p = embassy_stm32::init(embassy_stm32::Config::default());
    info!("Peripherals initialized");

    // SPI1 to the CC1101, mode 0
    let mut spi_config = spi::Config::default();
    spi_config.frequency = Hertz(SPI_FREQUENCY_HZ);
    let spi = Spi::new_blocking(p.SPI1, p.PA5, p.PA7, p.PA6, spi_config);
    let cs = Output::new(p.PA4, Level::High, Speed::VeryHigh);
    let radio = Cc1101::new(spi, cs).unwrap();

    // Host UART at 9600-8-N-1
    let mut uart_config = usart::Config::default();
    uart_config.baudrate = SERIAL_BAUD;
    let uart = Uart::new(
        p.USART1,
        p.PA10, // RX
        p.PA9,  // TX
        Irqs,
        p.DMA1_CH1,
        p.DMA1_CH2,
        uart_config,
    )
    .unwrap();
    let (host_tx, host_rx) = uart.split();
    let host_rx = host_rx.into_ring_buffered(UART_RX_BUF.init([0; 64]));

    let led = StatusLed::new(Output::new(p.PB0, Level::Low, Speed::Low));

    // Liveness supervisor: one stuck loop pass forces a full restart
    let watchdog = IndependentWatchdog::new(p.IWDG, WATCHDOG_TIMEOUT_US);

    spawner.spawn(tick_task()).unwrap();
    spawner.spawn(host_rx_task(host_rx)).unwrap();
    spawner.spawn(indicator_task(led)).unwrap();
    spawner.spawn(link_task(radio, host_tx, watchdog)).unwrap();

    info!("Tasks spawned");
}

/// 1 ms system tick driving the countdown timers
#[embassy_executor::task]
async fn tick_task() {
    let mut ticker = Ticker::every(Duration::from_millis(1));
    loop {
        ticker.next().await;
        LINK_TIMERS.tick_1ms();
    }
}

/// Streams host bytes from the UART DMA ring into the bridge queue.
/// The queue send blocks when the bridge is saturated, which leaves
/// further bytes in the DMA ring.
#[embassy_executor::task]
async fn host_rx_task(mut host_rx: RingBufferedUartRx<'static>) {
    let mut chunk = [0u8; 16];
    loop {
        match host_rx.read(&mut chunk).await {
            Ok(n) => {
                for &byte in &chunk[..n] {
                    HOST_BYTES.send(byte).await;
                }
            }
            Err(_) => {
                warn!("host uart receive error");
                Timer::after_millis(10).await;
            }
        }
    }
}

/// Drives the activity LED from the indicator countdown
#[embassy_executor::task]
async fn indicator_task(mut led: StatusLed<'static>) {
    let mut ticker = Ticker::every(Duration::from_millis(10));
    loop {
        ticker.next().await;
        led.set(LINK_TIMERS.indicator_lit());
    }
}

/// Radio boot sequence followed by the endless arbitration loop
#[embassy_executor::task]
async fn link_task(
    mut radio: Radio,
    mut host_tx: UartTx<'static, Async>,
    mut watchdog: IndependentWatchdog<'static, peripherals::IWDG>,
) {
    let mut delay = Delay;
    match initialize(&mut radio, &mut delay) {
        Ok(report) => {
            if report.register_faults > 0 {
                warn!("config verify failed for {} registers", report.register_faults);
                let _ = host_tx.write(b"reg vrf\r\n").await;
            } else {
                info!("radio configured");
            }
        }
        Err(_) => warn!("radio bus fault during boot"),
    }

    watchdog.unleash();

    let mut engine = LinkEngine::new();
    loop {
        watchdog.pet();

        // move host bytes into the outgoing packet; bytes the bridge
        // cannot take yet stay queued
        while engine.ready_for_host_bytes() {
            match HOST_BYTES.try_receive() {
                Ok(byte) => {
                    engine.accept_host_byte(byte, &LINK_TIMERS);
                }
                Err(_) => break,
            }
        }

        match engine.poll(&mut radio, &LINK_TIMERS) {
            Ok(outcome) => {
                if let Some(pkt) = outcome.delivered {
                    if host_tx.write(pkt.payload()).await.is_err() {
                        warn!("host serial write failed");
                    }
                }
                if outcome.rx == RxOutcome::Corrupt {
                    warn!("rx fifo desync, flushed");
                }
                if outcome.tx == Some(TxOutcome::CapacityAnomaly) {
                    warn!("tx occupancy above fifo size");
                }
            }
            Err(_) => warn!("radio bus fault"),
        }

        Timer::after_millis(LOOP_PERIOD_MS).await;
    }
}
