//! Random resource names and admin credentials
//!
//! Names carry a fixed per-resource prefix plus a random lowercase
//! alphanumeric suffix so repeated runs never collide inside a subscription.

use rand::seq::SliceRandom;
use rand::Rng;

const NAME_CHARSET: &[u8] = b"abcdefghijklmnopqrstuvwxyz0123456789";
const NAME_SUFFIX_LEN: usize = 8;

const PASSWORD_UPPER: &[u8] = b"ABCDEFGHJKLMNPQRSTUVWXYZ";
const PASSWORD_LOWER: &[u8] = b"abcdefghijkmnpqrstuvwxyz";
const PASSWORD_DIGITS: &[u8] = b"23456789";
const PASSWORD_SPECIAL: &[u8] = b"!@#$%&*-_=+";
const PASSWORD_RANDOM_LEN: usize = 12;

/// Generate a resource name with the given prefix and a random suffix.
pub fn random_name(prefix: &str) -> String {
    let mut rng = rand::thread_rng();
    let suffix: String = (0..NAME_SUFFIX_LEN)
        .map(|_| NAME_CHARSET[rng.gen_range(0..NAME_CHARSET.len())] as char)
        .collect();
    format!("{prefix}{suffix}")
}

/// Generate an admin username valid for Linux VMs.
pub fn random_username() -> String {
    random_name("vmuser")
}

/// Generate an admin password meeting the platform complexity rules
/// (12+ characters, all four character classes present).
pub fn random_password() -> String {
    let mut rng = rand::thread_rng();
    let pick = |set: &[u8], rng: &mut rand::rngs::ThreadRng| set[rng.gen_range(0..set.len())] as char;

    let mut chars: Vec<char> = vec![
        pick(PASSWORD_UPPER, &mut rng),
        pick(PASSWORD_LOWER, &mut rng),
        pick(PASSWORD_DIGITS, &mut rng),
        pick(PASSWORD_SPECIAL, &mut rng),
    ];
    for _ in 0..PASSWORD_RANDOM_LEN {
        let set = [
            PASSWORD_UPPER,
            PASSWORD_LOWER,
            PASSWORD_DIGITS,
            PASSWORD_SPECIAL,
        ][rng.gen_range(0..4)];
        chars.push(pick(set, &mut rng));
    }
    chars.shuffle(&mut rng);
    chars.into_iter().collect()
}

/// The full set of names and credentials one run provisions with
#[derive(Debug, Clone)]
pub struct ResourceNames {
    pub resource_group: String,
    pub virtual_network: String,
    pub subnet: String,
    /// Regional (zoneless) public IP, attached to the first machine
    pub public_ip1: String,
    /// Zone-pinned public IP, attached to the second machine
    pub public_ip2: String,
    pub nic1: String,
    pub nic2: String,
    pub data_disk: String,
    pub vm1: String,
    pub vm2: String,
    pub vm1_computer: String,
    pub vm2_computer: String,
    pub admin_username: String,
    pub admin_password: String,
}

impl ResourceNames {
    /// Generate a fresh, collision-free name set for one run.
    pub fn generate() -> Self {
        Self {
            resource_group: random_name("rgCOMV"),
            virtual_network: random_name("VirtualNetwork_"),
            subnet: random_name("subnet_"),
            public_ip1: random_name("pip1"),
            public_ip2: random_name("pip2"),
            nic1: random_name("networkInterface"),
            nic2: random_name("networkInterface"),
            data_disk: random_name("ds"),
            vm1: random_name("lVM1"),
            vm2: random_name("lVM2"),
            vm1_computer: random_name("linuxComputer"),
            vm2_computer: random_name("zonalComputer"),
            admin_username: random_username(),
            admin_password: random_password(),
        }
    }
}
