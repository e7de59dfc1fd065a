//! Hardware watchdog supervision from the loop.

use super::printer;

#[test]
fn running_loop_keeps_the_board_alive() {
    let mut p = printer();
    p.run_for(3.0);
    assert_eq!(p.hal().watchdog_resets(), 0);
    assert!(p.watchdog().kicks() >= 3000);
    assert!(p.watchdog().max_gap() <= p.time().ticks(0.002));
}

#[test]
fn stalled_loop_resets_the_board() {
    let mut p = printer();
    p.run_for(0.1);
    let stall = p.time().ticks(2.5);
    p.hal_mut().advance(stall);
    p.service_interrupts();
    assert_eq!(p.hal().watchdog_resets(), 1);
}
