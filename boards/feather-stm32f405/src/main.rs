#![deny(unsafe_code)]
#![deny(warnings)]
#![no_main]
#![no_std]

use defmt_rtt as _; // global logger
use panic_probe as _;
use binclock_core::{Scheduler, SyncIndicator};
use rtic::app;
use rtic_monotonics::stm32::prelude::*;

mod eth;
mod network;
mod time;

stm32_tim2_monotonic!(Mono, 1_000_000);

/// Number of display lines (D); one period is 86400 / 2^8 = 337.5 s
const DISPLAY_LINES: usize = 8;

/// APB1 timers run at 2 x 42 MHz
const APB1_TIMER_CLOCK_HZ: u32 = 84_000_000;

/// Set by the TIM5 interrupt, drained by idle
static SCHEDULER: Scheduler = Scheduler::new();

/// Read by the heartbeat LED
static SYNC: SyncIndicator = SyncIndicator::new();

#[app(device = embassy_stm32, peripherals = true, dispatchers = [USART1, USART2, USART3])]
mod app {
    use super::*;
    use binclock_core::{
        Clock, ClockConfig, ClockOffset, Display, PeriodCounter, SntpSource, SyncStatus,
    };
    use defmt::{error, info, warn};
    use embassy_futures::join::join3;
    use embassy_stm32::exti::ExtiInput;
    use embassy_stm32::gpio::{Level, Output, Pull, Speed};
    use embassy_stm32::peripherals;
    use embassy_stm32::rcc::{Hse, HseMode, LsConfig, LseConfig, LseMode};
    use embassy_stm32::rtc::{Rtc, RtcConfig};
    use embassy_stm32::spi::{self, Spi};
    use embassy_stm32::time::Hertz;
    use hal_abstractions::PeriodicAlarm;

    use network::{manager, EmbassyUdp};
    use time::{StmRtc, Tim5Alarm};

    type Counter = PeriodCounter<Output<'static>, DISPLAY_LINES>;

    type SpiPeripheral = embassy_stm32::Peri<'static, peripherals::SPI2>;
    type PinPB13 = embassy_stm32::Peri<'static, peripherals::PB13>;
    type PinPB15 = embassy_stm32::Peri<'static, peripherals::PB15>;
    type PinPB14 = embassy_stm32::Peri<'static, peripherals::PB14>;
    type PinPC6 = embassy_stm32::Peri<'static, peripherals::PC6>;
    type PinPC3 = embassy_stm32::Peri<'static, peripherals::PC3>;
    type PinPC2 = embassy_stm32::Peri<'static, peripherals::PC2>;
    type ExtiChannel = embassy_stm32::Peri<'static, peripherals::EXTI2>;
    type DmaTx = embassy_stm32::Peri<'static, peripherals::DMA1_CH4>;
    type DmaRx = embassy_stm32::Peri<'static, peripherals::DMA1_CH3>;

    struct NetworkPeripherals {
        spi: SpiPeripheral,
        sck: PinPB13,
        mosi: PinPB15,
        miso: PinPB14,
        cs: PinPC6,
        reset: PinPC3,
        int: PinPC2,
        exti: ExtiChannel,
        dma_tx: DmaTx,
        dma_rx: DmaRx,
    }

    /// Everything the clock needs before the display can start
    struct ClockParts {
        rtc: Rtc,
        lines: [Output<'static>; DISPLAY_LINES],
        alarm: Tim5Alarm,
    }

    #[shared]
    struct Shared {
        /// `None` until the first seeding
        counter: Option<Counter>,
    }

    #[local]
    struct Local {
        led: Output<'static>,
    }

    #[init]
    fn init(_cx: init::Context) -> (Shared, Local) {
        info!("Binary clock starting...");

        // Adafruit Feather STM32F405: 12 MHz HSE, 32.768 kHz LSE (PC14/PC15)
        let mut config = embassy_stm32::Config::default();
        config.rcc.hse = Some(Hse {
            freq: Hertz(12_000_000),
            mode: HseMode::Oscillator,
        });

        // HSE (12 MHz) / PREDIV(6) = 2 MHz (PLL input)
        // 2 MHz * MUL(168) = 336 MHz (VCO)
        // VCO / DIVP(4) = 84 MHz (SYSCLK)
        config.rcc.pll_src = embassy_stm32::rcc::PllSource::HSE;
        config.rcc.pll = Some(embassy_stm32::rcc::Pll {
            prediv: embassy_stm32::rcc::PllPreDiv::DIV6,
            mul: embassy_stm32::rcc::PllMul::MUL168,
            divp: Some(embassy_stm32::rcc::PllPDiv::DIV4),
            divq: Some(embassy_stm32::rcc::PllQDiv::DIV7),
            divr: None,
        });
        config.rcc.sys = embassy_stm32::rcc::Sysclk::PLL1_P;
        config.rcc.ahb_pre = embassy_stm32::rcc::AHBPrescaler::DIV1; // 84 MHz
        config.rcc.apb1_pre = embassy_stm32::rcc::APBPrescaler::DIV2; // 42 MHz
        config.rcc.apb2_pre = embassy_stm32::rcc::APBPrescaler::DIV1; // 84 MHz

        config.rcc.ls = LsConfig {
            rtc: embassy_stm32::rcc::RtcClockSource::LSE,
            lsi: false,
            lse: Some(LseConfig {
                frequency: Hertz(32_768),
                mode: LseMode::Oscillator(embassy_stm32::rcc::LseDrive::MediumHigh),
            }),
        };

        let p = embassy_stm32::init(config);
        info!("System initialized with HSE (12MHz) and LSE (32.768kHz)");

        Mono::start(APB1_TIMER_CLOCK_HZ);
        info!("TIM2 monotonic timer initialized at 1 MHz");

        let rtc = Rtc::new(p.RTC, RtcConfig::default());

        // Line 0 is the most significant bit
        let lines = [
            Output::new(p.PA4, Level::Low, Speed::Low),
            Output::new(p.PA5, Level::Low, Speed::Low),
            Output::new(p.PA6, Level::Low, Speed::Low),
            Output::new(p.PA7, Level::Low, Speed::Low),
            Output::new(p.PC4, Level::Low, Speed::Low),
            Output::new(p.PC5, Level::Low, Speed::Low),
            Output::new(p.PC7, Level::Low, Speed::Low),
            Output::new(p.PB8, Level::Low, Speed::Low),
        ];

        let led = Output::new(p.PC1, Level::High, Speed::Low);

        let net_periph = NetworkPeripherals {
            spi: p.SPI2,
            sck: p.PB13,
            mosi: p.PB15,
            miso: p.PB14,
            cs: p.PC6,
            reset: p.PC3,
            int: p.PC2,
            exti: p.EXTI2,
            dma_tx: p.DMA1_CH4,
            dma_rx: p.DMA1_CH3,
        };

        let parts = ClockParts {
            rtc,
            lines,
            alarm: Tim5Alarm::new(APB1_TIMER_CLOCK_HZ),
        };

        heartbeat::spawn().ok();
        network_task::spawn(net_periph, parts).ok();

        (Shared { counter: None }, Local { led })
    }

    /// Heartbeat LED, blink pattern follows the sync status
    #[task(priority = 1, local = [led])]
    async fn heartbeat(cx: heartbeat::Context) {
        info!("Heartbeat task started");
        loop {
            let (on, off): (u64, u64) = match SYNC.current() {
                SyncStatus::Synchronized => (100, 4900),
                SyncStatus::Stale => (100, 900),
                SyncStatus::Unsynchronized => (100, 200),
            };
            cx.local.led.set_high();
            Mono::delay(on.millis()).await;
            cx.local.led.set_low();
            Mono::delay(off.millis()).await;
        }
    }

    /// Network task: DHCP, initial sync, seeding, then optional resyncs
    ///
    /// Stack is !Send and must remain within this task.
    #[task(priority = 1, shared = [counter])]
    async fn network_task(
        cx: network_task::Context,
        periph: NetworkPeripherals,
        parts: ClockParts,
    ) -> ! {
        use embassy_net::{Config, StackResources};
        use static_cell::StaticCell;

        info!("Network task started");

        let config = ClockConfig::default();
        if let Err(e) = config.validate() {
            error!("Invalid clock configuration: {}", e);
        }
        let offset = config.offset().unwrap_or(ClockOffset::UTC);

        let ClockParts {
            rtc,
            lines,
            mut alarm,
        } = parts;
        let mut clock = Clock::new(StmRtc::new(rtc), offset);
        let mut counter = cx.shared.counter;

        let mut spi_config = spi::Config::default();
        spi_config.frequency = Hertz(10_000_000); // 10 MHz for W5500

        let spi = Spi::new(
            periph.spi,
            periph.sck,
            periph.mosi,
            periph.miso,
            periph.dma_tx,
            periph.dma_rx,
            spi_config,
        );

        let eth_periph = eth::EthPeripherals {
            spi,
            cs: Output::new(periph.cs, Level::High, Speed::VeryHigh),
            reset: Output::new(periph.reset, Level::High, Speed::Low),
            int: ExtiInput::new(periph.int, periph.exti, Pull::Up),
        };

        let mac_addr = [0x02, 0x00, 0x00, 0x12, 0x34, 0x56];
        let (device, w5500_runner) = match eth::init_w5500(eth_periph, mac_addr).await {
            Ok(pair) => pair,
            Err(_) => {
                warn!("No Ethernet, running from the RTC alone");
                start_display(&mut counter, &mut clock, lines, &mut alarm);
                loop {
                    Mono::delay(1.hours()).await;
                }
            }
        };

        static RESOURCES: StaticCell<StackResources<3>> = StaticCell::new();
        let (stack, mut net_runner) = embassy_net::new(
            device,
            Config::dhcpv4(Default::default()),
            RESOURCES.init(StackResources::new()),
            0x1234_5678_u64,
        );
        info!("Network stack initialized with DHCP");

        let app_logic = async {
            let mut source = SntpSource::with_config(EmbassyUdp::new(stack), config.sntp);

            if manager::wait_for_config(&stack, config.network_timeout_secs).await {
                sync(&mut clock, &mut source, &config).await;
            } else {
                warn!("Starting without network time");
            }
            start_display(&mut counter, &mut clock, lines, &mut alarm);

            // Resyncs correct the RTC only; the running counter keeps its own position
            loop {
                match config.resync_interval_secs {
                    Some(secs) => {
                        Mono::delay((secs as u64).secs()).await;
                        info!("NTP resync triggered");
                        sync(&mut clock, &mut source, &config).await;
                    }
                    None => Mono::delay(1.hours()).await,
                }
            }
        };

        join3(w5500_runner.run(), net_runner.run(), app_logic).await;
        // Both runners and the app logic loop forever
        loop {
            Mono::delay(1.hours()).await;
        }
    }

    async fn sync(
        clock: &mut Clock<StmRtc>,
        source: &mut SntpSource<EmbassyUdp>,
        config: &ClockConfig,
    ) {
        let policy = config.retry_policy();
        let mut delay = embassy_time::Delay;
        match clock
            .sync_with_retries(source, config.ntp_host, &policy, &mut delay)
            .await
        {
            Ok(utc) => info!("NTP sync successful: {} s UTC", utc.secs()),
            Err(e) => warn!("NTP sync failed: {}", e),
        }
        SYNC.publish(clock.status());
    }

    /// Seed the counter from the RTC, hand it to idle and start the alarm
    fn start_display(
        counter: &mut impl rtic::Mutex<T = Option<Counter>>,
        clock: &mut Clock<StmRtc>,
        lines: [Output<'static>; DISPLAY_LINES],
        alarm: &mut Tim5Alarm,
    ) {
        let secs = match clock.seconds_since_midnight() {
            Ok(secs) => secs,
            Err(e) => {
                error!("RTC read failed, seeding at midnight: {}", e);
                0
            }
        };
        let seeded = match Counter::seed(secs, Display::new(lines)) {
            Ok(seeded) => seeded,
            Err(e) => match e {},
        };
        counter.lock(|slot| *slot = Some(seeded));

        if let Err(e) = SCHEDULER.arm(alarm, Counter::MICROS_PER_PERIOD) {
            error!("Tick alarm not started: {}", e);
            alarm.stop();
        }
    }

    /// TIM5 update: flag a pending tick, nothing else
    #[task(binds = TIM5, priority = 2)]
    fn tick_alarm(_cx: tick_alarm::Context) {
        Tim5Alarm::acknowledge();
        SCHEDULER.on_alarm();
    }

    /// Sleep until any interrupt, then run at most one pending tick
    #[idle(shared = [counter])]
    fn idle(cx: idle::Context) -> ! {
        info!("Idle task started - entering WFI loop");
        let mut counter = cx.shared.counter;
        // WFI with interrupts masked still wakes on a pending alarm, so the
        // flag check and the sleep cannot be split by the TIM5 handler
        let sleep = |scheduler: &Scheduler| {
            cortex_m::interrupt::free(|_| {
                scheduler.sleep_unless_pending(cortex_m::asm::wfi);
            })
        };
        SCHEDULER.run_idle(sleep, || {
            counter.lock(|slot| {
                if let Some(counter) = slot.as_mut() {
                    match counter.tick() {
                        Ok(_) => {}
                        Err(e) => match e {},
                    }
                }
            })
        })
    }
}
