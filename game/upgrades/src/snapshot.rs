pub mod snapshot {
    use game_interface::types::{
        id_types::CharacterId,
        snapshot::{SnapItem, SnapObject},
    };
    use serde::{Deserialize, Serialize};

    use crate::{entities::entity::entity::SnapView, world::world::GameWorld};

    /// Who a snapshot is built for.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub enum SnapshotFor {
        /// A client, it only sees what is close to its own view position.
        Client(CharacterId),
        /// Demo recorders and the like, they see everything.
        Everything,
    }

    /// Everything one observer receives for a single tick.
    #[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
    pub struct SnapshotBuffer {
        pub tick: i32,
        pub items: Vec<SnapObject>,
    }

    impl SnapshotBuffer {
        pub fn build(world: &GameWorld, snap_for: SnapshotFor, cur_tick: i32, paused: bool) -> Self {
            let (observer, view_pos) = match snap_for {
                SnapshotFor::Client(id) => (Some(id), world.players().get(&id).map(|p| p.view_pos)),
                SnapshotFor::Everything => (None, None),
            };
            let view = SnapView {
                observer,
                view_pos,
                cur_tick,
                paused,
            };
            Self {
                tick: cur_tick,
                items: world.snap(&view),
            }
        }

        pub fn characters(&self) -> impl Iterator<Item = (u32, &SnapItem)> {
            self.items
                .iter()
                .filter(|obj| matches!(obj.item, SnapItem::Character(_)))
                .map(|obj| (obj.id, &obj.item))
        }

        pub fn encode(&self) -> anyhow::Result<Vec<u8>> {
            Ok(bincode::serde::encode_to_vec(
                self,
                bincode::config::standard(),
            )?)
        }

        pub fn decode(data: &[u8]) -> anyhow::Result<Self> {
            let (snapshot, _) =
                bincode::serde::decode_from_slice(data, bincode::config::standard())?;
            Ok(snapshot)
        }
    }

    #[cfg(test)]
    mod test {
        use game_interface::types::snapshot::{SnapItem, SnapObject, SnapPickup};

        use super::SnapshotBuffer;

        #[test]
        fn survives_the_wire() {
            let snapshot = SnapshotBuffer {
                tick: 1234,
                items: vec![SnapObject {
                    id: 3,
                    item: SnapItem::Pickup(SnapPickup {
                        x: -40,
                        y: 900,
                        ty: 1,
                    }),
                }],
            };
            let data = snapshot.encode().unwrap();
            assert_eq!(SnapshotBuffer::decode(&data).unwrap(), snapshot);
        }

        #[test]
        fn garbage_is_an_error() {
            assert!(SnapshotBuffer::decode(&[0xff; 3]).is_err());
        }
    }
}
