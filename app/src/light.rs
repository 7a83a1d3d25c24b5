use crate::hal;
use crate::hal::pac;
use crate::hal::time::Hertz;

/// Boost LED driver on TIM3 CH1.
///
/// The LED runs off a small boost converter whose switch node wants a
/// continuous square wave at a fixed frequency, nothing fancier. The
/// channel outputs a 50% duty wave and the on/off level is gated with
/// the compare output enable.
pub struct BoostLight {
    tim: pac::TIM3,
}

impl BoostLight {
    pub fn new<T>(tim: pac::TIM3, rcc: &mut hal::rcc::Rcc, frequency: T) -> Self
    where
        T: Into<Hertz>,
    {
        let rccregs = unsafe { pac::Peripherals::steal().RCC };
        rccregs.apb1enr.modify(|_, w| w.tim3en().set_bit());
        rccregs.apb1rstr.modify(|_, w| w.tim3rst().set_bit());
        rccregs.apb1rstr.modify(|_, w| w.tim3rst().clear_bit());

        let frequency = frequency.into().0;
        // If pclk is prescaled from hclk, the frequency fed into the timers is doubled
        let tclk = if rcc.clocks.hclk().0 == rcc.clocks.pclk().0 {
            rcc.clocks.pclk().0
        } else {
            rcc.clocks.pclk().0 * 2
        };
        let ticks = tclk / frequency;

        let psc = ((ticks - 1) / (1 << 16)) as u16;
        tim.psc.write(|w| w.psc().bits(psc));
        let arr = (ticks / (psc + 1) as u32) as u16;
        tim.arr.write(|w| w.arr().bits(arr));

        tim.ccmr1_output().modify(|_, w| {
            w.oc1m().pwm_mode1()
            .oc1pe().enabled()
        });
        tim.ccr1.write(|w| w.ccr().bits(arr / 2));

        tim.cr1.modify(|_, w| {
            w.cen().set_bit()
            .arpe().set_bit()
        });
        tim.egr.write(|w| w.ug().set_bit());

        Self { tim }
    }

    /// Gate the switching waveform on or off.
    pub fn set_level(&mut self, on: bool) {
        if on {
            self.tim.ccer.modify(|_, w| w.cc1e().set_bit());
        } else {
            self.tim.ccer.modify(|_, w| w.cc1e().clear_bit());
        }
    }

    /// Start or stop the switch timer counter. Stopped whenever the
    /// pattern is dark and no session is in progress, so an idle toy is
    /// not burning power clocking an unused timer.
    pub fn set_running(&mut self, run: bool) {
        if run {
            self.tim.cr1.modify(|_, w| w.cen().set_bit());
        } else {
            self.tim.cr1.modify(|_, w| w.cen().clear_bit());
        }
    }
}
