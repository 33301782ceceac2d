use adventure_engine::life::{apply_damage, heal, Health};
use adventure_engine::{Combatant, Monster};
use proptest::prelude::*;

#[test]
fn combatant_damage_goes_through_the_shared_pool() {
    let mut wolf = Monster::new("Wolf", 11, 13);
    let mut lines = Vec::new();

    assert!(!wolf.take_damage(4, &mut |l| lines.push(l)));
    assert_eq!(wolf.hit_points(), 7);
    assert!(wolf.take_damage(30, &mut |l| lines.push(l)));
    assert_eq!(wolf.hit_points(), 0);
    assert!(!wolf.is_alive());
    assert_eq!(lines.last().map(String::as_str), Some("[DOWN][Wolf] drops to 0 HP"));

    assert_eq!(wolf.heal(3, &mut |_| {}), 3);
    assert!(wolf.is_alive());
}

proptest! {
    #[test]
    fn hit_points_never_read_below_zero(
        max_hp in 1i32..200,
        hits in prop::collection::vec(0i32..80, 0..12),
    ) {
        let mut health = Health::new(max_hp);
        for dmg in hits {
            apply_damage("Target", &mut health, dmg, |_| {});
            prop_assert!(health.current() >= 0);
            prop_assert!(health.current() <= max_hp);
            prop_assert_eq!(health.is_alive(), health.current() > 0);
        }
    }

    #[test]
    fn healing_is_capped_at_max(max_hp in 1i32..100, dmg in 0i32..150, amount in 0i32..150) {
        let mut health = Health::new(max_hp);
        apply_damage("Target", &mut health, dmg, |_| {});
        let before = health.current();
        let gained = heal("Target", &mut health, amount, |_| {});
        prop_assert!(health.current() <= max_hp);
        prop_assert_eq!(health.current(), before + gained);
    }
}
