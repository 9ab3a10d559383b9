//! Implements `BoardGeometry` -- the attack tables.
//!
//! For every chess engine it is very important to be able to very
//! quickly find the attacking sets for all pieces, from all possible
//! origin squares, and all possible board occupations. For the
//! leapers (pawn, knight, king) a simple per-square table is enough.
//! For the sliders (bishop, rook, queen) we use the "magic
//! bitboards" technique to access pre-calculated attacking sets:
//!
//! 1. Mask the relevant occupancy bits to form a key. For example if
//!    you had a rook on A1, the relevant occupancy bits will be from
//!    A2-A7 and B1-G1 -- the edge squares do not affect the attack
//!    set and are left out.
//!
//! 2. Multiply the key by a "magic number" to obtain an index
//!    mapping. Such numbers can be found by brute-force trial and
//!    error with sparse random candidates.
//!
//! 3. Right shift the index mapping by `64 - n` bits to create an
//!    index, where `n` is the number of bits in the key.
//!
//! 4. Use the index to reference a pre-initialized attacks database.
//!
//! The magic multipliers below are constant data produced offline by
//! exactly that search; the attack database itself is filled in when
//! the `BoardGeometry` instance is created, verifying along the way
//! that the multipliers hash every relevant occupancy without
//! collision.

use lazy_static::lazy_static;
use crate::board::*;
use crate::bitsets::*;

/// The total number of slots in the slider attacks database.
const SLIDER_ATTACKS_SIZE: usize = 107648;

/// An object that for a particular slider (bishop or rook) at a
/// particular square, can "magically" find the corresponding attack
/// set, for all possible board occupations.
#[derive(Clone, Copy)]
struct AttacksMagic {
    pub offset: usize,
    pub mask: Bitboard,
    pub magic: u64,
    pub shift: u32,
}

impl AttacksMagic {
    /// Returns the index into the attacks database for a given board
    /// occupation.
    #[inline(always)]
    fn index(&self, occupied: Bitboard) -> usize {
        let hash = self.magic.wrapping_mul(occupied & self.mask) >> self.shift;
        self.offset.wrapping_add(hash as usize)
    }
}

/// Tables and methods useful for move generation and position
/// evaluation.
pub struct BoardGeometry {
    /// Contains the squares attacked by a pawn of each color from
    /// each square. (Those are attacked squares, not necessarily
    /// capture destinations -- the caller masks them with the enemy
    /// occupancy.)
    pawn_attacks: [[Bitboard; 64]; 2],

    /// Contains the squares attacked by a knight from each square.
    knight_attacks: [Bitboard; 64],

    /// Contains the squares attacked by a king from each square.
    king_attacks: [Bitboard; 64],

    /// Magic records for bishops and rooks, indexed by square.
    bishop_map: [AttacksMagic; 64],
    rook_map: [AttacksMagic; 64],

    /// The shared slider attacks database.
    slider_attacks: Vec<Bitboard>,
}

impl BoardGeometry {
    /// Creates and initializes a new instance.
    fn new() -> BoardGeometry {
        let mut geometry = BoardGeometry {
            pawn_attacks: [[0; 64]; 2],
            knight_attacks: [0; 64],
            king_attacks: [0; 64],
            bishop_map: [AttacksMagic {
                offset: 0,
                mask: 0,
                magic: 0,
                shift: 0,
            }; 64],
            rook_map: [AttacksMagic {
                offset: 0,
                mask: 0,
                magic: 0,
                shift: 0,
            }; 64],
            slider_attacks: Vec::with_capacity(SLIDER_ATTACKS_SIZE),
        };

        // Fill the pawn attack tables. The file masks prevent
        // wrap-around at the board edges.
        const PAWN_SHIFTS: [[isize; 2]; 2] = [[7, 9], [-9, -7]];
        for us in 0..2 {
            for square in 0..64 {
                geometry.pawn_attacks[us][square] =
                    gen_shift(1 << square, PAWN_SHIFTS[us][0]) & !BB_FILE_H |
                    gen_shift(1 << square, PAWN_SHIFTS[us][1]) & !BB_FILE_A;
            }
        }

        // Fill the knight and king attack tables.
        let knight_offsets = [(-1, -2), (-2, -1), (-2, 1), (-1, 2), (1, -2), (2, -1), (2, 1),
                              (1, 2)];
        let king_offsets = [(1, -1), (1, 0), (1, 1), (0, -1), (0, 1), (-1, -1), (-1, 0), (-1, 1)];
        for square in 0..64 {
            let (r, c) = ((square / 8) as isize, (square % 8) as isize);
            for &(dr, dc) in knight_offsets.iter() {
                if r + dr >= 0 && c + dc >= 0 && r + dr < 8 && c + dc < 8 {
                    geometry.knight_attacks[square] |= 1 << ((r + dr) * 8 + c + dc);
                }
            }
            for &(dr, dc) in king_offsets.iter() {
                if r + dr >= 0 && c + dc >= 0 && r + dr < 8 && c + dc < 8 {
                    geometry.king_attacks[square] |= 1 << ((r + dr) * 8 + c + dc);
                }
            }
        }

        // Fill the slider maps and the shared attacks database.
        let mut bishop_map = geometry.bishop_map;
        let mut rook_map = geometry.rook_map;
        init_slider_map(&mut bishop_map,
                        &BISHOP_MAGICS,
                        bb_bishop_attacks,
                        &mut geometry.slider_attacks,
                        false);
        init_slider_map(&mut rook_map,
                        &ROOK_MAGICS,
                        bb_rook_attacks,
                        &mut geometry.slider_attacks,
                        false);
        geometry.bishop_map = bishop_map;
        geometry.rook_map = rook_map;
        assert_eq!(geometry.slider_attacks.len(), SLIDER_ATTACKS_SIZE);

        geometry
    }

    /// Returns a reference to an initialized `BoardGeometry` object.
    ///
    /// The object is created only during the first call. All next
    /// calls will return a reference to the same object.
    pub fn get() -> &'static BoardGeometry {
        lazy_static! {
            static ref GEOMETRY: BoardGeometry = BoardGeometry::new();
        }
        &GEOMETRY
    }

    /// Returns the set of squares that are attacked by a piece from a
    /// given square.
    ///
    /// This function returns the set of squares that are attacked by
    /// a piece of type `piece` from the square `from_square`, on a
    /// board which is occupied with pieces according to the
    /// `occupied` bitboard. `piece` **must not** be a pawn (pawn
    /// attacks depend on the pawn's color -- use `pawn_attacks`). It
    /// does not matter if `from_square` is occupied or not.
    #[inline]
    pub fn attacks_from(&self, piece: Piece, from_square: Square, occupied: Bitboard) -> Bitboard {
        debug_assert!(!is_pawn(piece));
        debug_assert!(from_square <= 63);
        match piece % 6 {
            1 => self.knight_attacks[from_square],
            2 => self.slider_attacks[self.bishop_map[from_square].index(occupied)],
            3 => self.slider_attacks[self.rook_map[from_square].index(occupied)],
            4 => {
                self.slider_attacks[self.bishop_map[from_square].index(occupied)] |
                self.slider_attacks[self.rook_map[from_square].index(occupied)]
            }
            _ => self.king_attacks[from_square],
        }
    }

    /// Returns the set of squares attacked by a pawn of a given color
    /// from a given square.
    #[inline(always)]
    pub fn pawn_attacks(&self, color: Color, from_square: Square) -> Bitboard {
        debug_assert!(color <= 1);
        debug_assert!(from_square <= 63);
        self.pawn_attacks[color][from_square]
    }
}

/// A helper function for `BoardGeometry::new`. It initializes the
/// look-up tables for a particular slider (bishop or rook).
///
/// When `from_scratch` is `true` the precalculated magic constants
/// are ignored and new ones are searched for by rejection-sampling
/// sparse random candidates. This path is kept for regenerating the
/// constants; the normal startup verifies the precalculated ones
/// instead.
fn init_slider_map(piece_map: &mut [AttacksMagic; 64],
                   magics: &[u64; 64],
                   attacks: fn(Square, Bitboard) -> Bitboard,
                   slider_attacks: &mut Vec<Bitboard>,
                   from_scratch: bool) {
    use rand::Rng;
    let mut rng = rand::thread_rng();

    for (sq, entry) in piece_map.iter_mut().enumerate() {
        let edges = ((BB_RANK_1 | BB_RANK_8) & !bb_rank(sq)) |
                    ((BB_FILE_A | BB_FILE_H) & !bb_file(sq));
        let mask = attacks(sq, 1 << sq) & !edges;
        let num_ones = mask.count_ones();
        let shift = 64 - num_ones;

        // Enumerate all subsets of the mask (the Carry-Rippler
        // trick), recording the reference attack set for each.
        let mut occupancy = vec![0; 1 << num_ones];
        let mut reference = vec![0; 1 << num_ones];
        let mut size = 0;
        let mut occ: Bitboard = 0;
        loop {
            occupancy[size] = occ;
            reference[size] = attacks(sq, occ | (1 << sq));
            size += 1;
            occ = occ.wrapping_sub(mask) & mask;
            if occ == 0 {
                break;
            }
        }

        let mut magic = magics[sq];
        'outer: loop {
            if from_scratch {
                // Generate a new sparse random candidate.
                loop {
                    magic = rng.gen::<u64>() & rng.gen::<u64>() & rng.gen::<u64>();
                    if (magic.wrapping_mul(mask) >> 56).count_ones() >= 6 {
                        break;
                    }
                }
            }

            let mut attack_sets = vec![0; size];
            for i in 0..size {
                let index = magic.wrapping_mul(occupancy[i]) >> shift;
                let attack_set = &mut attack_sets[index as usize];
                if *attack_set != 0 && *attack_set != reference[i] {
                    assert!(from_scratch,
                            "precalculated magic is incorrect for square {}",
                            sq);
                    continue 'outer;
                }
                *attack_set = reference[i];
            }

            *entry = AttacksMagic {
                offset: slider_attacks.len(),
                mask: mask,
                magic: magic,
                shift: shift,
            };
            slider_attacks.extend_from_slice(&attack_sets);
            break;
        }
    }
}

/// A helper function. It returns the set of squares that are attacked
/// by a rook from a given square.
pub fn bb_rook_attacks(from_square: Square, occupied: Bitboard) -> Bitboard {
    bb_line_attacks(bb_file(from_square), from_square, occupied) |
    bb_line_attacks(bb_rank(from_square), from_square, occupied)
}

/// A helper function. It returns the set of squares that are attacked
/// by a bishop from a given square.
pub fn bb_bishop_attacks(from_square: Square, occupied: Bitboard) -> Bitboard {
    bb_line_attacks(bb_diag(from_square), from_square, occupied) |
    bb_line_attacks(bb_anti_diag(from_square), from_square, occupied)
}

/// A helper function for `bb_rook_attacks` and `bb_bishop_attacks`.
///
/// This function calculates the set of squares, lying on a single
/// straight line (a file, rank, diagonal, or anti-diagonal), that a
/// piece can attack from a given square and given board occupancy.
fn bb_line_attacks(line: Bitboard, from_square: Square, occupied: Bitboard) -> Bitboard {
    let from_square_bb = 1u64 << from_square;
    debug_assert!(from_square_bb & line != 0);
    let potential_blockers = occupied & line;
    let forward = potential_blockers.wrapping_sub(from_square_bb.wrapping_mul(2));
    let rev = reverse(reverse(potential_blockers)
                          .wrapping_sub(reverse(from_square_bb).wrapping_mul(2)));
    (forward ^ rev) & line
}

/// A helper function for `bb_line_attacks`. It reverses the order of
/// the bits in a 64-bit number.
fn reverse(v: u64) -> u64 {
    v.reverse_bits()
}

/// Pre-calculated bishop magic constants.
const BISHOP_MAGICS: [u64; 64] = [306397059236266368,
                                  6638343277122827280,
                                  10377420549504106496,
                                  9193021019258913,
                                  2306408226914042898,
                                  10379110636817760276,
                                  27167319028441088,
                                  7566153073497751552,
                                  1513227076520969216,
                                  301917653126479936,
                                  72075465430409232,
                                  2343002121441460228,
                                  36033212782477344,
                                  9223373154083475456,
                                  6935629192638251008,
                                  72621648200664064,
                                  2310506081245267984,
                                  2533291987569153,
                                  146934404644733024,
                                  1838417834950912,
                                  579856052833622016,
                                  1729946448243595776,
                                  705208029025040,
                                  2886877732040869888,
                                  10092575566416331020,
                                  5635409948247040,
                                  738739924278198804,
                                  4648849515743289408,
                                  9233786889293807616,
                                  1155253577929753088,
                                  435164712050360592,
                                  3026700562025580641,
                                  4612284839965491969,
                                  10448650511900137472,
                                  571823356120080,
                                  40569782189687936,
                                  148620986995048708,
                                  4901113822871308288,
                                  4612077461748908288,
                                  10204585674276944,
                                  2534512027246592,
                                  5766297627561820676,
                                  13809969191200768,
                                  1153062656578422784,
                                  9318235838682899712,
                                  11533824475839595776,
                                  433770548762247233,
                                  92326036501692936,
                                  9227053213059129360,
                                  577024872779350852,
                                  108087561569959936,
                                  582151826703646856,
                                  81404176367767,
                                  316415319130374273,
                                  9113856212762624,
                                  145453328103440392,
                                  441392350330618400,
                                  1126492748710916,
                                  2309220790581891072,
                                  3026423624667006980,
                                  18019391702696464,
                                  4516931289817600,
                                  1450317422841301124,
                                  9246488805123342592];

/// Pre-calculated rook magic constants.
const ROOK_MAGICS: [u64; 64] = [36028867955671040,
                                2395917338224361536,
                                936757656041832464,
                                648535942831284356,
                                36037595259731970,
                                13943151043426386048,
                                432349966580056576,
                                4683745813775001856,
                                1191624314978336800,
                                4611756662317916160,
                                4625338105090543616,
                                140806208356480,
                                1688987371057664,
                                9288708641522688,
                                153403870897537280,
                                281550411726850,
                                2401883155071024,
                                1206964838111645696,
                                166705754384925184,
                                36039792408011264,
                                10376580514281768960,
                                9148486532465664,
                                578787319189340418,
                                398007816633254020,
                                2341872150903791616,
                                2314850762536009728,
                                297238127310798880,
                                2251868801728768,
                                2594082183614301184,
                                820222482337235456,
                                37717655469424904,
                                577596144088011012,
                                1152991874030502016,
                                3171026856472219648,
                                20415869351890944,
                                4611844348286345472,
                                2455605323386324224,
                                140754676613632,
                                1740713828645089416,
                                58361257132164,
                                70370893791232,
                                9227880322828615684,
                                72092778695295040,
                                577023839834341392,
                                4723150143565660416,
                                563087661073408,
                                651083773116450,
                                72128789630550047,
                                153192758223054976,
                                869194865525653568,
                                4972009250306933248,
                                1031325449119138048,
                                1297041090863464576,
                                580401419157405824,
                                1657992643584,
                                306245066729521664,
                                15206439601351819394,
                                14143290885479661953,
                                1688988407201810,
                                18065251325837538,
                                1152927311403745429,
                                162411078742050817,
                                334255838724676,
                                27323018585852550];
