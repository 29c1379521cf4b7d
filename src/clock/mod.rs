/// 테스트 가능한 시간 주입을 위한 시계 추상화
use chrono::{DateTime, Utc};

/// 현재 시각 공급자 트레이트
///
/// 마감 판정이 전부 이 트레이트를 거치므로 테스트에서는
/// 목 시계를 주입해 결정적으로 검증할 수 있다.
pub trait Clock: Send + Sync {
    /// 현재 시각 조회
    fn now(&self) -> DateTime<Utc>;

    /// 현재 시각 조회 (epoch millis)
    fn now_millis(&self) -> i64 {
        self.now().timestamp_millis()
    }
}

/// 시스템 시계 구현체
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_system_clock_returns_reasonable_value() {
        let clock = SystemClock;
        let now = clock.now_millis();

        // 2020년 이후, 2100년 이전이어야 한다
        assert!(now > 1_577_836_800_000);
        assert!(now < 4_102_444_800_000);
    }

    #[test]
    fn test_system_clock_does_not_go_backwards() {
        let clock = SystemClock;
        let first = clock.now();
        let second = clock.now();

        assert!(second >= first);
    }
}
