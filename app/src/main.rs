#![no_main]
#![no_std]

use core::cell::{Cell, RefCell};
use cortex_m;
use cortex_m::interrupt::Mutex;
use cortex_m_rt::{entry, exception};
use panic_halt as _;

use stm32f0xx_hal as hal;

use touchseq::filter::TouchFilter;
use touchseq::sequencer::Sequencer;
use touchseq::{SeqConfig, TouchConfig};

use crate::hal::pac;
use crate::hal::pac::interrupt;
use crate::hal::prelude::*;

use crate::light::BoostLight;
use crate::sampler::CapSense;

mod light;
mod sampler;
mod serial;

static TOUCH_CONFIG: TouchConfig = TouchConfig {
    threshold: 20,
    hysteresis: 5,
    startup_cycles: 40,
    base_shift: 6,
    active_shift: 10,
};

static SEQ_CONFIG: SeqConfig = SeqConfig {
    divider: 2,
    countdown: 30,
};

/// Recorded pattern length. With 40ms ticks and divider 2 the pattern
/// loops every 8 seconds.
const SEQ_LENGTH: usize = 100;

/// Tick rate for the filter + sequencer step
const TICK_HZ: u32 = 25;

static CAPSENSE: Mutex<RefCell<Option<CapSense>>> = Mutex::new(RefCell::new(None));

/// Single-slot mailbox from the capture interrupt to the main loop.
/// Filled at most once per tick when a burst completes, taken once by
/// the tick step.
static RAW_LEVEL: Mutex<Cell<Option<u16>>> = Mutex::new(Cell::new(None));

#[entry]
fn main() -> ! {
    let dp = pac::Peripherals::take().unwrap();
    let cp = cortex_m::Peripherals::take().unwrap();
    let mut nvic = cp.NVIC;

    let mut flash = dp.FLASH;
    let mut rcc = dp.RCC.configure().sysclk(48.mhz()).freeze(&mut flash);
    let gpioa = dp.GPIOA.split(&mut rcc);
    let gpiob = dp.GPIOB.split(&mut rcc);

    // Interrupts are not enabled yet, so fabricating a critical section
    // for the gpio AF setters is fine here.
    let fake_cs = unsafe { cortex_m::interrupt::CriticalSection::new() };

    // Sense pin is TIM2 CH1 input capture; the drive pin charges and
    // discharges the pad through its series resistor
    let _sense = gpioa.pa0.into_alternate_af2(&fake_cs);
    let drive = gpioa.pa1.into_push_pull_output(&fake_cs);

    // Boost LED switch node
    let _light = gpiob.pb4.into_alternate_af1(&fake_cs);

    let capsense = CapSense::new(dp.TIM2, drive, &mut rcc);
    cortex_m::interrupt::free(|cs| {
        CAPSENSE.borrow(cs).borrow_mut().replace(capsense);
    });

    let mut light = BoostLight::new(dp.TIM3, &mut rcc, 100.khz());

    unsafe {
        nvic.set_priority(pac::Interrupt::TIM2, 2);
        cortex_m::peripheral::NVIC::unmask(pac::Interrupt::TIM2);
    }

    let mut syst = hal::timers::Timer::syst(cp.SYST, TICK_HZ.hz(), &mut rcc);
    syst.listen(&hal::timers::Event::TimeOut);

    let tx_pin = gpiob.pb6.into_alternate_af0(&fake_cs);
    let rx_pin = gpiob.pb7.into_alternate_af0(&fake_cs);
    let uart = hal::serial::Serial::usart1(dp.USART1, (tx_pin, rx_pin), 115200.bps(), &mut rcc);
    serial::uart1::init(uart, 4);

    let mut filter = TouchFilter::new(Some(&TOUCH_CONFIG));
    let mut seq = Sequencer::<SEQ_LENGTH>::new(Some(&SEQ_CONFIG));
    let mut tick: u32 = 0;

    loop {
        cortex_m::asm::wfi();

        // The burst for a tick always completes before the mailbox
        // fills, so one take here consumes one whole measurement.
        let raw = cortex_m::interrupt::free(|cs| RAW_LEVEL.borrow(cs).take());
        let raw = match raw {
            Some(raw) => raw,
            None => continue,
        };

        let edge = filter.push(raw);
        let level = seq.step(edge);
        light.set_level(level);

        // Keep the switch timer clocked only while there is something
        // to show or a session in progress
        light.set_running(seq.programming() || seq.has_light);

        tick = tick.wrapping_add(1);
        if tick % 32 == 0 {
            let mut writer = serial::uart1::writer();
            core::fmt::write(&mut writer, format_args!(
                "raw {} base {} edge {:?}\r\n",
                filter.raw_level, filter.base_level, edge)).ok();
        }
    }
}

#[exception]
fn SysTick() {
    // Tick boundary: kick off this tick's capture burst
    cortex_m::interrupt::free(|cs| {
        if let Some(capsense) = CAPSENSE.borrow(cs).borrow_mut().as_mut() {
            capsense.begin_burst();
        }
    });
}

#[interrupt]
fn TIM2() {
    cortex_m::interrupt::free(|cs| {
        if let Some(capsense) = CAPSENSE.borrow(cs).borrow_mut().as_mut() {
            if let Some(raw) = capsense.on_capture() {
                RAW_LEVEL.borrow(cs).set(Some(raw));
            }
        }
    });
}
