use evrd_assets::{
    AssetTransfer, ContentHash, NewAsset, ProtocolVersion, ReissueAsset, SerializeTarget,
};
use evrd_primitives::encoding::{decode, encode, Decoder};

const NAME_CHARS: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789._";

struct Lcg {
    state: u64,
}

impl Lcg {
    fn new(seed: u64) -> Self {
        Self { state: seed }
    }

    fn next_u64(&mut self) -> u64 {
        self.state = self.state.wrapping_mul(6364136223846793005).wrapping_add(1);
        self.state
    }

    fn next_u32(&mut self) -> u32 {
        (self.next_u64() >> 32) as u32
    }

    fn next_u8(&mut self) -> u8 {
        (self.next_u64() >> 56) as u8
    }

    fn next_bool(&mut self) -> bool {
        self.next_u64() >> 63 == 1
    }

    fn gen_range(&mut self, max: usize) -> usize {
        if max == 0 {
            0
        } else {
            (self.next_u64() % max as u64) as usize
        }
    }
}

fn random_string(rng: &mut Lcg, min: usize, max: usize) -> String {
    let len = min + rng.gen_range(max - min + 1);
    (0..len)
        .map(|_| char::from(NAME_CHARS[rng.gen_range(NAME_CHARS.len())]))
        .collect()
}

fn random_name(rng: &mut Lcg) -> String {
    if rng.next_bool() {
        let root = random_string(rng, 1, 12);
        let tag = random_string(rng, 1, 12);
        format!("{root}#{tag}")
    } else {
        random_string(rng, 1, 31)
    }
}

fn random_hash(rng: &mut Lcg) -> Option<ContentHash> {
    let digest = std::array::from_fn(|_| rng.next_u8());
    match rng.gen_range(3) {
        0 => None,
        1 => Some(ContentHash::Txid(digest)),
        _ => Some(ContentHash::Ipfs(digest)),
    }
}

fn random_version(rng: &mut Lcg) -> ProtocolVersion {
    if rng.next_bool() {
        ProtocolVersion::TollUpgrade
    } else {
        ProtocolVersion::Standard
    }
}

fn random_new_asset(rng: &mut Lcg, target: SerializeTarget) -> NewAsset {
    let ipfs_hash = random_hash(rng);
    let mut asset = NewAsset {
        name: random_name(rng),
        amount: rng.next_u64() as i64,
        units: rng.next_u8() as i8,
        reissuable: rng.next_bool(),
        has_ipfs: ipfs_hash.is_some(),
        ipfs_hash,
        version: random_version(rng),
        ..NewAsset::null()
    };
    if asset.version.is_toll() {
        asset.permanent_ipfs_hash = random_hash(rng);
        asset.toll_amount = rng.next_u64() as i64;
        asset.toll_address = random_string(rng, 0, 34);
        asset.toll_amount_mutable = rng.next_bool();
        asset.toll_address_mutable = rng.next_bool();
        asset.remintable = rng.next_bool();
        if asset.is_unique() {
            asset.expiring_time = rng.next_u32();
        }
        if target == SerializeTarget::Disk {
            asset.total_burned = rng.next_u64() as i64;
            asset.currently_burned = rng.next_u64() as i64;
        }
    }
    asset
}

fn random_reissue(rng: &mut Lcg) -> ReissueAsset {
    let mut reissue = ReissueAsset {
        name: random_name(rng),
        amount: rng.next_u64() as i64,
        units: rng.next_u8() as i8,
        reissuable: rng.next_bool(),
        ipfs_hash: random_hash(rng),
        version: random_version(rng),
        ..ReissueAsset::null()
    };
    if reissue.version.is_toll() {
        reissue.permanent_ipfs_hash = random_hash(rng);
        reissue.toll_amount = rng.next_bool().then(|| rng.next_u64() as i64);
        reissue.toll_address = random_string(rng, 0, 34);
        reissue.reminting = rng.next_bool();
        reissue.toll_amount_mutable = rng.next_bool();
        reissue.toll_address_mutable = rng.next_bool();
        reissue.remintable = rng.next_bool();
    }
    reissue
}

fn random_transfer(rng: &mut Lcg) -> AssetTransfer {
    let mut transfer = AssetTransfer::new(random_name(rng), rng.next_u64() as i64);
    transfer.message = random_hash(rng);
    if transfer.message.is_some() && rng.next_bool() {
        transfer.expire_time = (rng.next_u64() >> 1) as i64;
    }
    transfer
}

#[test]
fn new_asset_round_trip() {
    let mut rng = Lcg::new(0x5eed_0001);
    for target in [SerializeTarget::Network, SerializeTarget::Disk] {
        for _ in 0..500 {
            let asset = random_new_asset(&mut rng, target);
            let bytes = asset.to_bytes(target);
            let mut decoder = Decoder::new(&bytes);
            let decoded = NewAsset::decode_from(&mut decoder, target).expect("decode");
            assert!(decoder.is_empty());
            assert_eq!(decoded, asset);
        }
    }
}

#[test]
fn reissue_round_trip() {
    let mut rng = Lcg::new(0x5eed_0002);
    for _ in 0..500 {
        let reissue = random_reissue(&mut rng);
        let decoded: ReissueAsset = decode(&encode(&reissue)).expect("decode");
        assert_eq!(decoded, reissue);
    }
}

#[test]
fn transfer_round_trip() {
    let mut rng = Lcg::new(0x5eed_0003);
    for _ in 0..500 {
        let transfer = random_transfer(&mut rng);
        let decoded: AssetTransfer = decode(&encode(&transfer)).expect("decode");
        assert_eq!(decoded, transfer);
    }
}

#[test]
fn truncated_records_never_panic() {
    let mut rng = Lcg::new(0x5eed_0004);
    for _ in 0..200 {
        let asset = random_new_asset(&mut rng, SerializeTarget::Disk);
        let bytes = asset.to_bytes(SerializeTarget::Disk);
        let cut = rng.gen_range(bytes.len());
        let mut decoder = Decoder::new(&bytes[..cut]);
        let _ = NewAsset::decode_from(&mut decoder, SerializeTarget::Disk);

        let reissue = encode(&random_reissue(&mut rng));
        let cut = rng.gen_range(reissue.len());
        let _ = decode::<ReissueAsset>(&reissue[..cut]);
    }
}
