use crate::hal::pac;
use crate::hal::prelude::*;
use crate::hal::rcc::Rcc;
use stm32f0xx_hal::gpio::{gpioa, Output, PushPull};

use touchseq::burst::{BurstEvent, CapBurst, DEFAULT_CAP_CYCLES};

/// Count rate for burst timestamps
const COUNT_FREQ: u32 = 1_000_000;

type DrivePin = gpioa::PA1<Output<PushPull>>;

/// Capacitive sampler built on TIM2.
///
/// The counter free-runs at 1MHz. CH1 captures both edges of the sense
/// line, so each RC transition of the pad lands one timestamp and one
/// interrupt. A burst is started from the tick interrupt with
/// [`begin_burst`](Self::begin_burst); the capture interrupt then feeds
/// [`on_capture`](Self::on_capture) until the burst completes and
/// yields the tick's raw level.
pub struct CapSense {
    tim: pac::TIM2,
    drive: DrivePin,
    drive_high: bool,
    burst: Option<CapBurst>,
}

impl CapSense {
    pub fn new(tim: pac::TIM2, drive: DrivePin, rcc: &mut Rcc) -> Self {
        let rccregs = unsafe { pac::Peripherals::steal().RCC };
        rccregs.apb1enr.modify(|_, w| w.tim2en().set_bit());
        rccregs.apb1rstr.modify(|_, w| w.tim2rst().set_bit());
        rccregs.apb1rstr.modify(|_, w| w.tim2rst().clear_bit());

        // If pclk is prescaled from hclk, the frequency fed into the timers is doubled
        let clk_freq = if rcc.clocks.hclk().0 == rcc.clocks.pclk().0 {
            rcc.clocks.pclk().0
        } else {
            rcc.clocks.pclk().0 * 2
        };
        let psc = (clk_freq / COUNT_FREQ - 1) as u16;
        tim.psc.write(|w| w.psc().bits(psc));
        tim.arr.write(|w| w.arr().bits(0xffff_ffff));

        // CH1 as input capture from TI1, sensitive to both edges
        tim.ccmr1_input().modify(|_, w| unsafe { w.cc1s().bits(0b01) });
        tim.ccer.modify(|_, w| {
            w.cc1p().set_bit()
            .cc1np().set_bit()
            .cc1e().set_bit()
        });
        tim.dier.write(|w| w.cc1ie().set_bit());

        tim.cr1.modify(|_, w| w.cen().set_bit());
        tim.egr.write(|w| w.ug().set_bit());
        tim.sr.write(|w| unsafe { w.bits(0) });

        Self {
            tim,
            drive,
            drive_high: false,
            burst: None,
        }
    }

    fn toggle_drive(&mut self) {
        if self.drive_high {
            self.drive.set_low().ok();
        } else {
            self.drive.set_high().ok();
        }
        self.drive_high = !self.drive_high;
    }

    /// Start this tick's capture burst. Called from the tick interrupt.
    pub fn begin_burst(&mut self) {
        let now = self.tim.cnt.read().bits() as u16;
        self.burst = Some(CapBurst::begin(now, DEFAULT_CAP_CYCLES));
        self.toggle_drive();
    }

    /// Handle a CH1 capture event. Returns the raw level once the burst
    /// completes; captures outside a burst are ignored.
    pub fn on_capture(&mut self) -> Option<u16> {
        let captured = self.tim.ccr1.read().bits() as u16;
        self.tim.sr.write(|w| unsafe { w.bits(0) });

        let burst = match self.burst.as_mut() {
            Some(burst) => burst,
            None => return None,
        };

        match burst.capture(captured) {
            BurstEvent::Toggle => {
                self.toggle_drive();
                None
            }
            BurstEvent::Done(raw) => {
                self.burst = None;
                Some(raw)
            }
        }
    }
}
