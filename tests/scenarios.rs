use std::error::Error;
use std::time::Duration;

use rand::SeedableRng;
use rand::rngs::SmallRng;
use tile_merge::{
    Board, BoardConfig, BoardListener, Dimensions, Direction, MemoryStore, MoveResponse, Position,
    Session, SpawnStrategy, TileId,
};

#[derive(Default)]
struct Events {
    points: u64,
    game_overs: usize,
    spawned: Vec<Position<u8>>,
}

impl BoardListener<u8> for Events {
    fn on_score_delta(&mut self, points: u64) {
        self.points += points;
    }

    fn on_game_over(&mut self) {
        self.game_overs += 1;
    }

    fn on_tile_spawned(&mut self, _: TileId, position: Position<u8>, _: u64) {
        self.spawned.push(position);
    }
}

fn config(width: u8, height: u8) -> Result<BoardConfig<u8>, Box<dyn Error>> {
    Ok(BoardConfig::new(Dimensions::try_from((width, height))?).with_settle_delay(Duration::ZERO))
}

#[test]
fn pair_merges_to_the_left() -> Result<(), Box<dyn Error>> {
    for seed in 0..16 {
        let mut board = Board::seeded(config(4, 4)?, seed);
        board.insert_tile((0, 0), 2)?;
        board.insert_tile((1, 0), 2)?;
        let mut events = Events::default();

        let response = board.request_move(Direction::Left, &mut events);
        println!("{board}");
        assert_eq!(MoveResponse::Settled { game_over: false }, response);
        assert_eq!(Some(4), board.value_at((0, 0)));
        assert_eq!(4, events.points);
        assert_eq!(1, events.spawned.len());
        assert_ne!(Position::from((0, 0)), events.spawned[0]);
        assert_eq!(Some(2), board.value_at(events.spawned[0]));
        assert_eq!(2, board.tile_count());
        assert!(!board.is_game_over());
        assert_eq!(0, events.game_overs);
    }
    Ok(())
}

#[test]
fn degenerate_strip_fills_up() -> Result<(), Box<dyn Error>> {
    let config = config(2, 1)?.with_settle_delay(Duration::from_millis(100));
    let mut board = Board::seeded(config, 1);
    board.insert_tile((0, 0), 2)?;
    board.insert_tile((1, 0), 2)?;
    let mut events = Events::default();

    assert_eq!(
        MoveResponse::Settling,
        board.request_move(Direction::Left, &mut events)
    );
    assert_eq!(Some(4), board.value_at((0, 0)));
    assert_eq!(None, board.value_at((1, 0)));
    assert_eq!(1, board.grid().empty_count());
    assert!(!board.is_full());
    assert!(!board.check_for_game_over());

    // The only free cell receives the spawn, leaving [4, 2] with nothing to merge.
    let tick = board.update(None, Duration::from_millis(100), &mut events);
    assert_eq!(Some(true), tick.settled);
    assert_eq!(vec![Position::from((1, 0))], events.spawned);
    assert_eq!(Some(2), board.value_at((1, 0)));
    assert!(board.is_full());
    assert!(board.is_game_over());
    assert_eq!(1, events.game_overs);
    Ok(())
}

#[test]
fn uniform_spawns_still_avoid_tiles() -> Result<(), Box<dyn Error>> {
    let config = config(3, 3)?.with_spawn_strategy(SpawnStrategy::Uniform);
    let mut board = Board::new(config, SmallRng::seed_from_u64(5));
    for _ in 0..9 {
        board.create_tile()?;
    }
    assert!(board.is_full());
    assert_eq!(9, board.tile_count());
    assert!(board.create_tile().is_err());
    Ok(())
}

#[test]
fn a_whole_game_keeps_its_invariants() -> Result<(), Box<dyn Error>> {
    let config = BoardConfig::new(Dimensions::try_from((4u8, 4))?);
    let mut session = Session::new(Board::seeded(config, 2048), MemoryStore::default());
    session.new_game()?;
    let directions = [
        Direction::Up,
        Direction::Left,
        Direction::Down,
        Direction::Right,
    ];

    let mut stuck = 0;
    for turn in 0..10_000 {
        if session.is_game_over() {
            break;
        }
        let dir = directions[turn % directions.len()];
        let tick = session.update(Some(dir), Duration::from_millis(16));
        match tick.response {
            Some(MoveResponse::Unchanged) => stuck += 1,
            Some(MoveResponse::Settling) => {
                stuck = 0;
                assert_eq!(
                    MoveResponse::Ignored,
                    session.request_move(-dir),
                    "moves must be dropped while settling"
                );
                session.settle_now();
            }
            _ => stuck = 0,
        }
        assert!(stuck < 4, "every direction was blocked without a game over");

        let board = session.board();
        let occupied = board
            .grid()
            .cells()
            .iter()
            .filter(|cell| cell.is_occupied())
            .count();
        assert_eq!(occupied, board.tile_count());
        assert!(board.tile_count() <= board.grid().size());
        for (_, tile) in board.tiles() {
            assert!(tile.value().is_power_of_two() && tile.value() >= 2);
            assert!(!tile.is_locked());
        }
    }
    println!("{}", session.board());
    assert!(session.is_game_over());
    assert!(session.board().is_full());
    assert!(session.board().check_for_game_over());
    assert_eq!(session.score(), session.high_score());
    Ok(())
}
