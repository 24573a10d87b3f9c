//! Builtin body codes: barycenters, the Sun, planets and their principal satellites.

/// Canonical `(code, name)` pairs.
pub const BODY_NAMES: &[(i32, &str)] = &[
    (0, "SOLAR SYSTEM BARYCENTER"),
    (1, "MERCURY BARYCENTER"),
    (2, "VENUS BARYCENTER"),
    (3, "EARTH BARYCENTER"),
    (4, "MARS BARYCENTER"),
    (5, "JUPITER BARYCENTER"),
    (6, "SATURN BARYCENTER"),
    (7, "URANUS BARYCENTER"),
    (8, "NEPTUNE BARYCENTER"),
    (9, "PLUTO BARYCENTER"),
    (10, "SUN"),
    (199, "MERCURY"),
    (299, "VENUS"),
    (301, "MOON"),
    (399, "EARTH"),
    (401, "PHOBOS"),
    (402, "DEIMOS"),
    (499, "MARS"),
    (501, "IO"),
    (502, "EUROPA"),
    (503, "GANYMEDE"),
    (504, "CALLISTO"),
    (599, "JUPITER"),
    (601, "MIMAS"),
    (602, "ENCELADUS"),
    (603, "TETHYS"),
    (604, "DIONE"),
    (605, "RHEA"),
    (606, "TITAN"),
    (607, "HYPERION"),
    (608, "IAPETUS"),
    (609, "PHOEBE"),
    (699, "SATURN"),
    (701, "ARIEL"),
    (702, "UMBRIEL"),
    (703, "TITANIA"),
    (704, "OBERON"),
    (705, "MIRANDA"),
    (799, "URANUS"),
    (801, "TRITON"),
    (802, "NEREID"),
    (899, "NEPTUNE"),
    (901, "CHARON"),
    (999, "PLUTO"),
];

/// Lookup-only synonyms.
pub const BODY_ALIASES: &[(&str, i32)] = &[
    ("SSB", 0),
    ("SOLAR SYSTEM BARYCENTRE", 0),
    ("EMB", 3),
    ("EARTH MOON BARYCENTER", 3),
    ("EARTH-MOON BARYCENTER", 3),
    ("EARTH MOON BARYCENTRE", 3),
    ("MARS BARYCENTRE", 4),
];
