//! Catalog of the low-pass filter kernels used to build the VIF pyramid.
//!
//! Each [`KernelScale`] names one physical blur spread and owns four kernels,
//! one per pyramid level. Kernels are odd-length, symmetric and normalized.

#![allow(clippy::excessive_precision, clippy::unreadable_literal)]

/// Number of pyramid levels every scale variant provides.
pub const NUM_LEVELS: usize = 4;

/// Kernel widths the vectorized convolution backend is specialized for.
pub const ACCELERATED_WIDTHS: [usize; 4] = [17, 9, 5, 3];

/// Blur spread of the kernel family, relative to the baseline spread of 1.0.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum KernelScale {
    /// 1.0, the standard VIF filter bank.
    #[default]
    Unit,
    /// 0.5
    Half,
    /// 1.5
    ThreeHalves,
    /// 2.0
    Double,
    /// 2.0 / 3.0
    TwoThirds,
    /// 2.4
    TwelveFifths,
    /// 360.0 / 97.0
    Ratio360Over97,
    /// 4.0 / 3.0
    FourThirds,
    /// 3.5 / 3.0
    SevenSixths,
    /// 3.75 / 3.0
    FiveFourths,
    /// 4.25 / 3.0
    SeventeenTwelfths,
}

impl KernelScale {
    /// All variants, in catalog order.
    pub const ALL: [KernelScale; 11] = [
        KernelScale::Unit,
        KernelScale::Half,
        KernelScale::ThreeHalves,
        KernelScale::Double,
        KernelScale::TwoThirds,
        KernelScale::TwelveFifths,
        KernelScale::Ratio360Over97,
        KernelScale::FourThirds,
        KernelScale::SevenSixths,
        KernelScale::FiveFourths,
        KernelScale::SeventeenTwelfths,
    ];

    /// Position of this variant in the catalog, in `0..11`.
    #[must_use]
    pub const fn index(self) -> usize {
        self as usize
    }

    /// Inverse of [`index`][Self::index].
    #[must_use]
    pub fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }

    /// The spread factor this variant was generated for.
    #[must_use]
    pub fn value(self) -> f64 {
        match self {
            KernelScale::Unit => 1.0,
            KernelScale::Half => 0.5,
            KernelScale::ThreeHalves => 1.5,
            KernelScale::Double => 2.0,
            KernelScale::TwoThirds => 2.0 / 3.0,
            KernelScale::TwelveFifths => 2.4,
            KernelScale::Ratio360Over97 => 360.0 / 97.0,
            KernelScale::FourThirds => 4.0 / 3.0,
            KernelScale::SevenSixths => 3.5 / 3.0,
            KernelScale::FiveFourths => 3.75 / 3.0,
            KernelScale::SeventeenTwelfths => 4.25 / 3.0,
        }
    }

    /// Maps a numeric spread (as given on a command line) to its variant.
    ///
    /// Returns `None` when no catalog entry lies within `1e-5` of `value`.
    #[must_use]
    pub fn from_value(value: f64) -> Option<Self> {
        Self::ALL
            .iter()
            .copied()
            .find(|scale| (scale.value() - value).abs() < 1e-5)
    }
}

/// One 1D kernel of the catalog.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FilterKernel {
    pub coeffs: &'static [f32],
    pub width: usize,
}

/// Looks up the kernel for `scale` at pyramid `level`.
///
/// # Panics
/// If `level >= NUM_LEVELS`.
#[must_use]
pub fn kernel(scale: KernelScale, level: usize) -> FilterKernel {
    assert!(
        level < NUM_LEVELS,
        "pyramid level {} out of range (0..{})",
        level,
        NUM_LEVELS
    );
    let coeffs = FILTER_TABLE[scale.index()][level];
    let width = FILTER_WIDTH[scale.index()][level];
    debug_assert_eq!(coeffs.len(), width);
    FilterKernel { coeffs, width }
}

/// Kernel widths, indexed like the coefficient table.
pub const FILTER_WIDTH: [[usize; NUM_LEVELS]; 11] = [
    [17, 9, 5, 3],
    [9, 5, 3, 3],
    [27, 15, 9, 5],
    [35, 19, 11, 7],
    [13, 7, 5, 3],
    [41, 23, 13, 9],
    [65, 35, 19, 13],
    [23, 13, 7, 5],
    [21, 11, 7, 5],
    [23, 13, 7, 5],
    [25, 13, 9, 5],
];

static FILTER_TABLE: [[&[f32]; NUM_LEVELS]; 11] = [
    UNIT,
    HALF,
    THREE_HALVES,
    DOUBLE,
    TWO_THIRDS,
    TWELVE_FIFTHS,
    RATIO_360_97,
    FOUR_THIRDS,
    SEVEN_SIXTHS,
    FIVE_FOURTHS,
    SEVENTEEN_TWELFTHS,
];

// 1.0
const UNIT: [&[f32]; NUM_LEVELS] = [
    &[
        0.00745626912, 0.0142655009, 0.0250313189, 0.0402820669, 0.0594526194, 0.0804751068,
        0.0999041125, 0.113746084, 0.118773937, 0.113746084, 0.0999041125, 0.0804751068,
        0.0594526194, 0.0402820669, 0.0250313189, 0.0142655009, 0.00745626912,
    ],
    &[
        0.0189780835, 0.0558981746, 0.120920904, 0.192116052, 0.224173605, 0.192116052,
        0.120920904, 0.0558981746, 0.0189780835,
    ],
    &[
        0.054488685, 0.244201347, 0.402619958, 0.244201347, 0.054488685,
    ],
    &[
        0.166378498, 0.667243004, 0.166378498,
    ],
];

// 0.5
const HALF: [&[f32]; NUM_LEVELS] = [
    &[
        0.01483945381483146, 0.04981728920101665, 0.11832250618647212, 0.19882899654808195,
        0.2363835084991954, 0.19882899654808195, 0.11832250618647212, 0.04981728920101665,
        0.01483945381483146,
    ],
    &[
        0.03765705331865383, 0.23993597758503457, 0.4448139381926232, 0.23993597758503457,
        0.03765705331865383,
    ],
    &[
        0.10650697891920077, 0.7869860421615985, 0.10650697891920077,
    ],
    &[
        0.00383625879916893, 0.9923274824016621, 0.00383625879916893,
    ],
];

// 1.5
const THREE_HALVES: [&[f32]; NUM_LEVELS] = [
    &[
        0.003061411879755733, 0.004950361473107714, 0.007702910451476288, 0.011533883865671363,
        0.01661877803810386, 0.02304227676257057, 0.030743582802885815, 0.039471747635457924,
        0.04876643642871142, 0.057977365173867444, 0.06632827707341536, 0.07301998612791924,
        0.0773548527900372, 0.07885625899404015, 0.0773548527900372, 0.07301998612791924,
        0.06632827707341536, 0.057977365173867444, 0.04876643642871142, 0.039471747635457924,
        0.030743582802885815, 0.02304227676257057, 0.01661877803810386, 0.011533883865671363,
        0.007702910451476288, 0.004950361473107714, 0.003061411879755733,
    ],
    &[
        0.005155279152239917, 0.012574282300781493, 0.026738695950137843, 0.049570492793231676,
        0.08011839616706516, 0.11289306247174812, 0.13868460659463525, 0.14853036914032117,
        0.13868460659463525, 0.11289306247174812, 0.08011839616706516, 0.049570492793231676,
        0.026738695950137843, 0.012574282300781493, 0.005155279152239917,
    ],
    &[
        0.007614419169296345, 0.03607496968918391, 0.10958608179781394, 0.2134445419434044,
        0.26655997480060273, 0.2134445419434044, 0.10958608179781394, 0.03607496968918391,
        0.007614419169296345,
    ],
    &[
        0.03765705331865383, 0.23993597758503457, 0.4448139381926232, 0.23993597758503457,
        0.03765705331865383,
    ],
];

// 2.0
const DOUBLE: [&[f32]; NUM_LEVELS] = [
    &[
        0.0026037269587503567, 0.0037202012799425984, 0.005201699435890725, 0.007117572324831842,
        0.009530733850673961, 0.012489027248675568, 0.016015433656466918, 0.02009817440675194,
        0.024682113028122028, 0.02966305528852977, 0.03488648739727233, 0.04015192995666896,
        0.045223422276224175, 0.04984576229541491, 0.05376515201297315, 0.05675202106130506,
        0.058623211304833, 0.059260552433345506, 0.058623211304833, 0.05675202106130506,
        0.05376515201297315, 0.04984576229541491, 0.045223422276224175, 0.04015192995666896,
        0.03488648739727233, 0.02966305528852977, 0.024682113028122028, 0.02009817440675194,
        0.016015433656466918, 0.012489027248675568, 0.009530733850673961, 0.007117572324831842,
        0.005201699435890725, 0.0037202012799425984, 0.0026037269587503567,
    ],
    &[
        0.004908790159284653, 0.009458290945313327, 0.01687098713840658, 0.027858513730912443,
        0.04258582005051434, 0.06026452109898014, 0.07894925354042928, 0.09574673424578385,
        0.10749531455964786, 0.11172354906145505, 0.10749531455964786, 0.09574673424578385,
        0.07894925354042928, 0.06026452109898014, 0.04258582005051434, 0.027858513730912443,
        0.01687098713840658, 0.009458290945313327, 0.004908790159284653,
    ],
    &[
        0.008812229292562283, 0.027143577143479366, 0.06511405659938266, 0.12164907301380957,
        0.17699835683135567, 0.2005654142388208, 0.17699835683135567, 0.12164907301380957,
        0.06511405659938266, 0.027143577143479366, 0.008812229292562283,
    ],
    &[
        0.014646255580395366, 0.08312087071417153, 0.23555925344404363, 0.3333472405227789,
        0.23555925344404363, 0.08312087071417153, 0.014646255580395366,
    ],
];

// 2.0/3
const TWO_THIRDS: [&[f32]; NUM_LEVELS] = [
    &[
        0.005316919191158936, 0.015508616400966175, 0.03723543338250509, 0.07358853152438767,
        0.11971104580936091, 0.16029821187968224, 0.17668248362387792, 0.16029821187968224,
        0.11971104580936091, 0.07358853152438767, 0.03723543338250509, 0.015508616400966175,
        0.005316919191158936,
    ],
    &[
        0.014646255580395366, 0.08312087071417153, 0.23555925344404363, 0.3333472405227789,
        0.23555925344404363, 0.08312087071417153, 0.014646255580395366,
    ],
    &[
        0.006646032999923536, 0.1942255544092176, 0.5982568251817177, 0.1942255544092176,
        0.006646032999923536,
    ],
    &[
        0.04038789325328935, 0.9192242134934214, 0.04038789325328935,
    ],
];

// 2.4
const TWELVE_FIFTHS: [&[f32]; NUM_LEVELS] = [
    &[
        0.0024545290205999935, 0.003289682353098358, 0.004343275824783345, 0.005648830035496486,
        0.007237311348814264, 0.009134266042662214, 0.01135658376291313, 0.0139091122480005,
        0.01678142232148741, 0.019945079588083118, 0.023351803735371327, 0.026932876628807743,
        0.030600089953844747, 0.0342484022907008, 0.03776031258766088, 0.04101176848166929,
        0.04387923676578804, 0.046247395983335465, 0.048016793525188006, 0.04911076259025178,
        0.04948092982288614, 0.04911076259025178, 0.048016793525188006, 0.046247395983335465,
        0.04387923676578804, 0.04101176848166929, 0.03776031258766088, 0.0342484022907008,
        0.030600089953844747, 0.026932876628807743, 0.023351803735371327, 0.019945079588083118,
        0.01678142232148741, 0.0139091122480005, 0.01135658376291313, 0.009134266042662214,
        0.007237311348814264, 0.005648830035496486, 0.004343275824783345, 0.003289682353098358,
        0.0024545290205999935,
    ],
    &[
        0.003637908247873508, 0.0063855489460743495, 0.010623647203380349, 0.016752435202957758,
        0.02503866437045789, 0.03547098721241576, 0.047628214164962705, 0.0606155744031302,
        0.07311947377207272, 0.08360086952227502, 0.09059775517499266, 0.09305784355881423,
        0.09059775517499266, 0.08360086952227502, 0.07311947377207272, 0.0606155744031302,
        0.047628214164962705, 0.03547098721241576, 0.02503866437045789, 0.016752435202957758,
        0.010623647203380349, 0.0063855489460743495, 0.003637908247873508,
    ],
    &[
        0.007350293016136075, 0.019098337505782634, 0.04171460426536077, 0.07659181203740582,
        0.11821653158869994, 0.15338247260964522, 0.1672918979539392, 0.15338247260964522,
        0.11821653158869994, 0.07659181203740582, 0.04171460426536077, 0.019098337505782634,
        0.007350293016136075,
    ],
    &[
        0.00585668412070982, 0.03167315245079435, 0.10575256915549137, 0.21799709606017553,
        0.27744099642565795, 0.21799709606017553, 0.10575256915549137, 0.03167315245079435,
        0.00585668412070982,
    ],
];

// 360.0 / 97.0
const RATIO_360_97: [&[f32]; NUM_LEVELS] = [
    &[
        0.0012816791204082075, 0.0015620523909898277, 0.0018918399027484485,
        0.0022769089575337843, 0.0027231994378439997, 0.003236575413413638, 0.0038226497837505957,
        0.004486583874601567, 0.005232865467640872, 0.006065070407937307, 0.006985614620544574,
        0.00799550497717726, 0.009094098875819743, 0.010278883514029925, 0.011545286536358305,
        0.012886529914069893, 0.01429353848739285, 0.01575491351167377, 0.017256979780457923,
        0.018783912474459312, 0.02031794687526095, 0.021839670601917226, 0.023328394235385276,
        0.024762592283158524, 0.026120402622622926, 0.02738016907584346, 0.028521008836012274,
        0.02952338429169555, 0.03036965754835163, 0.03104460574645926, 0.03153587618024757,
        0.03183436222109175, 0.03193448406620358, 0.03183436222109175, 0.03153587618024757,
        0.03104460574645926, 0.03036965754835163, 0.02952338429169555, 0.028521008836012274,
        0.02738016907584346, 0.026120402622622926, 0.024762592283158524, 0.023328394235385276,
        0.021839670601917226, 0.02031794687526095, 0.018783912474459312, 0.017256979780457923,
        0.01575491351167377, 0.01429353848739285, 0.012886529914069893, 0.011545286536358305,
        0.010278883514029925, 0.009094098875819743, 0.00799550497717726, 0.006985614620544574,
        0.006065070407937307, 0.005232865467640872, 0.004486583874601567, 0.0038226497837505957,
        0.003236575413413638, 0.0027231994378439997, 0.0022769089575337843, 0.0018918399027484485,
        0.0015620523909898277, 0.0012816791204082075,
    ],
    &[
        0.0023644174536255184, 0.0034221036550523224, 0.0048431811011422285, 0.006702499696259348,
        0.009070086779378358, 0.012002027755765152, 0.015529817658257908, 0.01964927955626293,
        0.02431058735737885, 0.029411204931348196, 0.03479354885462776, 0.04024882291916349,
        0.0455277497133199, 0.05035791396527277, 0.0544662936498729, 0.05760450646430479,
        0.05957357217624005, 0.060244772625455, 0.05957357217624005, 0.05760450646430479,
        0.0544662936498729, 0.05035791396527277, 0.0455277497133199, 0.04024882291916349,
        0.03479354885462776, 0.029411204931348196, 0.02431058735737885, 0.01964927955626293,
        0.015529817658257908, 0.012002027755765152, 0.009070086779378358, 0.006702499696259348,
        0.0048431811011422285, 0.0034221036550523224, 0.0023644174536255184,
    ],
    &[
        0.005739705984167229, 0.010638831007972463, 0.018338687970180532, 0.029397655644830867,
        0.04382553457697562, 0.06075917001712261, 0.07833692675250763, 0.09392718641207363,
        0.10473363656553764, 0.10860533013726342, 0.10473363656553764, 0.09392718641207363,
        0.07833692675250763, 0.06075917001712261, 0.04382553457697562, 0.029397655644830867,
        0.018338687970180532, 0.010638831007972463, 0.005739705984167229,
    ],
    &[
        0.004765886490117418, 0.014449429659230515, 0.03580755131873149, 0.07252962766809999,
        0.1200806914901692, 0.16249792490873866, 0.17973777692982543, 0.16249792490873866,
        0.1200806914901692, 0.07252962766809999, 0.03580755131873149, 0.014449429659230515,
        0.004765886490117418,
    ],
];

// 4.0 / 3.0
const FOUR_THIRDS: [&[f32]; NUM_LEVELS] = [
    &[
        0.00468593450369258, 0.007810637942127317, 0.012400648305837857, 0.018752961660127826,
        0.027012385060515166, 0.0370615509191398, 0.048434167336838044, 0.06029033231050093,
        0.07148437238577607, 0.0807313343364795, 0.08684418500467246, 0.08898298046858494,
        0.08684418500467246, 0.0807313343364795, 0.07148437238577607, 0.06029033231050093,
        0.048434167336838044, 0.0370615509191398, 0.027012385060515166, 0.018752961660127826,
        0.012400648305837857, 0.007810637942127317, 0.00468593450369258,
    ],
    &[
        0.007350293016136075, 0.019098337505782634, 0.04171460426536077, 0.07659181203740582,
        0.11821653158869994, 0.15338247260964522, 0.1672918979539392, 0.15338247260964522,
        0.11821653158869994, 0.07659181203740582, 0.04171460426536077, 0.019098337505782634,
        0.007350293016136075,
    ],
    &[
        0.023977406661157635, 0.09784278911234541, 0.22749130044200694, 0.30137700756898,
        0.22749130044200694, 0.09784278911234541, 0.023977406661157635,
    ],
    &[
        0.021929644862389363, 0.22851214688447105, 0.49911641650627925, 0.22851214688447105,
        0.021929644862389363,
    ],
];

// 3.5 / 3.0
const SEVEN_SIXTHS: [&[f32]; NUM_LEVELS] = [
    &[
        0.004225481445163885, 0.0077284175478382604, 0.013264883597653383, 0.021365585324475772,
        0.03229420764197194, 0.04580711688347506, 0.060973309616983565, 0.07616317964123727,
        0.08927890406929252, 0.09820896199705818, 0.10137990446970037, 0.09820896199705818,
        0.08927890406929252, 0.07616317964123727, 0.060973309616983565, 0.04580711688347506,
        0.03229420764197194, 0.021365585324475772, 0.013264883597653383, 0.0077284175478382604,
        0.004225481445163885,
    ],
    &[
        0.011253064073270563, 0.03121967849226136, 0.06904092264126249, 0.12170411773975143,
        0.17101117222357906, 0.19154208965975011, 0.17101117222357906, 0.12170411773975143,
        0.06904092264126249, 0.03121967849226136, 0.011253064073270563,
    ],
    &[
        0.012560200468474614, 0.07882796468173003, 0.23729607711717063, 0.34263151546524945,
        0.23729607711717063, 0.07882796468173003, 0.012560200468474614,
    ],
    &[
        0.009620056834605945, 0.20542369732245147, 0.5699124916858852, 0.20542369732245147,
        0.009620056834605945,
    ],
];

// 3.75 / 3.0
const FIVE_FOURTHS: [&[f32]; NUM_LEVELS] = [
    &[
        0.003317211135862137, 0.0059324619144260895, 0.01003813004663814, 0.01607040018215851,
        0.024342018059788077, 0.03488530174522498, 0.04730253352513053, 0.06068513681455791,
        0.07366077493233217, 0.08459530222840861, 0.09192046741565756, 0.09450052399963076,
        0.09192046741565756, 0.08459530222840861, 0.07366077493233217, 0.06068513681455791,
        0.04730253352513053, 0.03488530174522498, 0.024342018059788077, 0.01607040018215851,
        0.01003813004663814, 0.0059324619144260895, 0.003317211135862137,
    ],
    &[
        0.0050830940167887065, 0.01506448350708729, 0.03664323313832898, 0.0731554625933815,
        0.11987073595060249, 0.16121038612766267, 0.17794520933229682, 0.16121038612766267,
        0.11987073595060249, 0.0731554625933815, 0.03664323313832898, 0.01506448350708729,
        0.0050830940167887065,
    ],
    &[
        0.017988208587689274, 0.08909618039160763, 0.2326921801242316, 0.3204468617929429,
        0.2326921801242316, 0.08909618039160763, 0.017988208587689274,
    ],
    &[
        0.015199625365883403, 0.21875173294350592, 0.5320972833812214, 0.21875173294350592,
        0.015199625365883403,
    ],
];

// 4.25 / 3.0
const SEVENTEEN_TWELFTHS: [&[f32]; NUM_LEVELS] = [
    &[
        0.0037535214972137234, 0.006161856952968067, 0.009688687555946651, 0.014591465886006169,
        0.021048130695628536, 0.02908096232945107, 0.03848439382348116, 0.04877992869222271,
        0.059221350419380495, 0.06886460899713377, 0.07669984741736877, 0.08182265140547183,
        0.08360518865545416, 0.08182265140547183, 0.07669984741736877, 0.06886460899713377,
        0.059221350419380495, 0.04877992869222271, 0.03848439382348116, 0.02908096232945107,
        0.021048130695628536, 0.014591465886006169, 0.009688687555946651, 0.006161856952968067,
        0.0037535214972137234,
    ],
    &[
        0.009923596815614544, 0.023121061729092417, 0.0461910237358901, 0.07912588025538068,
        0.11622262324531331, 0.14637737178419374, 0.15807688486903043, 0.14637737178419374,
        0.11622262324531331, 0.07912588025538068, 0.0461910237358901, 0.023121061729092417,
        0.009923596815614544,
    ],
    &[
        0.005235891862728509, 0.029948577627467506, 0.10407966050653025, 0.21976557644809397,
        0.2819405871103595, 0.21976557644809397, 0.10407966050653025, 0.029948577627467506,
        0.005235891862728509,
    ],
    &[
        0.029519066107809168, 0.23537051469301665, 0.47022083839834844, 0.23537051469301665,
        0.029519066107809168,
    ],
];
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kernels_are_normalized() {
        for scale in KernelScale::ALL {
            for level in 0..NUM_LEVELS {
                let k = kernel(scale, level);
                let sum: f64 = k.coeffs.iter().map(|&c| f64::from(c)).sum();
                assert!(
                    (sum - 1.0).abs() < 1e-5,
                    "{:?} level {}: sum {}",
                    scale,
                    level,
                    sum
                );
            }
        }
    }

    #[test]
    fn kernels_are_symmetric_and_odd() {
        for scale in KernelScale::ALL {
            for level in 0..NUM_LEVELS {
                let k = kernel(scale, level);
                assert_eq!(k.width % 2, 1);
                for i in 0..k.width {
                    assert_eq!(k.coeffs[i], k.coeffs[k.width - 1 - i]);
                }
            }
        }
    }

    #[test]
    fn width_table_matches_coefficients() {
        for scale in KernelScale::ALL {
            let widths = FILTER_WIDTH[scale.index()];
            for level in 0..NUM_LEVELS {
                assert_eq!(FILTER_TABLE[scale.index()][level].len(), widths[level]);
            }
            assert!(widths.windows(2).all(|w| w[1] <= w[0]), "{:?}", scale);
        }
        assert_eq!(FILTER_WIDTH[KernelScale::Unit.index()], ACCELERATED_WIDTHS);
    }

    #[test]
    fn scale_lookup_by_value() {
        assert_eq!(KernelScale::from_value(1.0), Some(KernelScale::Unit));
        assert_eq!(
            KernelScale::from_value(360.0 / 97.0),
            Some(KernelScale::Ratio360Over97)
        );
        assert_eq!(
            KernelScale::from_value(4.25 / 3.0),
            Some(KernelScale::SeventeenTwelfths)
        );
        assert_eq!(KernelScale::from_value(3.0), None);
        for (i, scale) in KernelScale::ALL.iter().enumerate() {
            assert_eq!(KernelScale::from_index(i), Some(*scale));
        }
        assert_eq!(KernelScale::from_index(11), None);
    }

    #[test]
    #[should_panic(expected = "out of range")]
    fn level_out_of_range_panics() {
        let _ = kernel(KernelScale::Unit, NUM_LEVELS);
    }
}
